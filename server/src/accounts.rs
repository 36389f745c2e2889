//! User accounts: creation, credential checks and profile updates.

use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

use crate::auth::{hash_password, verify_password};
use crate::error::ApiError;
use crate::models::{NewUser, User};
use crate::schema::users;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Lowercase the domain part of an email address, leaving the local part as given.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::validation("email", "This field may not be blank"));
    }
    match email.rsplit_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace) =>
        {
            Ok(())
        }
        _ => Err(ApiError::validation("email", "Enter a valid email address")),
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::validation(
            "password",
            format!(
                "Ensure this field has at least {} characters",
                MIN_PASSWORD_LENGTH
            ),
        ));
    }
    Ok(())
}

fn duplicate_email(e: DieselError) -> ApiError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ApiError::validation("email", "User with this email already exists")
        }
        other => other.into(),
    }
}

/// Fields accepted when registering a user.
#[derive(Debug, Clone, Copy)]
pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

fn insert_user(
    conn: &mut SqliteConnection,
    account: NewAccount<'_>,
    privileged: bool,
) -> Result<User, ApiError> {
    let email = normalize_email(account.email);
    validate_email(&email)?;
    validate_password(account.password)?;

    let password_hash = hash_password(account.password).map_err(|e| {
        tracing::error!("Failed to hash password: {}", e);
        ApiError::PasswordHash
    })?;

    let new_user = NewUser {
        email: &email,
        password_hash: &password_hash,
        name: account.name.trim(),
        is_staff: privileged,
        is_superuser: privileged,
    };

    diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(duplicate_email)
}

/// Create a regular user with a hashed password and a normalized email.
pub fn create_user(conn: &mut SqliteConnection, account: NewAccount<'_>) -> Result<User, ApiError> {
    insert_user(conn, account, false)
}

/// Create a user with staff and superuser flags set.
pub fn create_superuser(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    insert_user(
        conn,
        NewAccount {
            email,
            password,
            name: "",
        },
        true,
    )
}

/// Look up an active user by email and check the password.
pub fn authenticate(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> Result<Option<User>, ApiError> {
    let user = users::table
        .filter(users::email.eq(normalize_email(email)))
        .filter(users::is_active.eq(true))
        .select(User::as_select())
        .first(conn)
        .optional()?;

    Ok(user.filter(|u| verify_password(password, &u.password_hash)))
}

/// Profile fields that may change. `None` leaves the field as it is.
#[derive(Debug, Default, Clone)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = users)]
struct UserChangeset {
    email: Option<String>,
    password_hash: Option<String>,
    name: Option<String>,
    updated_at: chrono::NaiveDateTime,
}

pub fn update_profile(
    conn: &mut SqliteConnection,
    user: &User,
    changes: ProfileChanges,
) -> Result<User, ApiError> {
    let email = match changes.email {
        Some(email) => {
            let email = normalize_email(&email);
            validate_email(&email)?;
            Some(email)
        }
        None => None,
    };

    let password_hash = match changes.password {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(&password).map_err(|e| {
                tracing::error!("Failed to hash password: {}", e);
                ApiError::PasswordHash
            })?)
        }
        None => None,
    };

    let changeset = UserChangeset {
        email,
        password_hash,
        name: changes.name.map(|n| n.trim().to_string()),
        updated_at: Utc::now().naive_utc(),
    };

    diesel::update(users::table.find(user.id))
        .set(&changeset)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(duplicate_email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    fn with_conn(f: impl FnOnce(&mut SqliteConnection)) {
        let (_dir, pool) = test_pool();
        let mut conn = pool.get().unwrap();
        f(&mut conn);
    }

    #[test]
    fn test_normalize_email_lowercases_domain_only() {
        assert_eq!(normalize_email("karan@GMAIL.COM"), "karan@gmail.com");
        assert_eq!(normalize_email("Karan@Example.Org"), "Karan@example.org");
        assert_eq!(normalize_email("  a@B.c "), "a@b.c");
    }

    #[test]
    fn test_create_user_with_email_successfully() {
        with_conn(|conn| {
            let user = create_user(
                conn,
                NewAccount {
                    email: "karanverma@gmail.com",
                    password: "password123",
                    name: "",
                },
            )
            .unwrap();

            assert_eq!(user.email, "karanverma@gmail.com");
            assert!(verify_password("password123", &user.password_hash));
            assert!(user.is_active);
            assert!(!user.is_staff);
        });
    }

    #[test]
    fn test_new_user_email_normalized() {
        with_conn(|conn| {
            let user = create_user(
                conn,
                NewAccount {
                    email: "karan@GMAIL.COM",
                    password: "test123",
                    name: "",
                },
            )
            .unwrap();
            assert_eq!(user.email, "karan@gmail.com");
        });
    }

    #[test]
    fn test_new_user_invalid_email() {
        with_conn(|conn| {
            for email in ["", "no-at-sign", "@example.com", "someone@"] {
                let err = create_user(
                    conn,
                    NewAccount {
                        email,
                        password: "test123",
                        name: "",
                    },
                )
                .unwrap_err();
                assert!(matches!(
                    err,
                    ApiError::Validation {
                        field: Some("email"),
                        ..
                    }
                ));
            }
        });
    }

    #[test]
    fn test_duplicate_email_rejected_after_normalization() {
        with_conn(|conn| {
            let account = NewAccount {
                email: "dup@example.com",
                password: "test123",
                name: "",
            };
            create_user(conn, account).unwrap();

            let err = create_user(
                conn,
                NewAccount {
                    email: "dup@EXAMPLE.com",
                    ..account
                },
            )
            .unwrap_err();
            assert!(matches!(
                err,
                ApiError::Validation {
                    field: Some("email"),
                    ..
                }
            ));
        });
    }

    #[test]
    fn test_create_new_superuser() {
        with_conn(|conn| {
            let user = create_superuser(conn, "karan@gmail.com", "test123").unwrap();
            assert!(user.is_superuser);
            assert!(user.is_staff);
        });
    }

    #[test]
    fn test_authenticate() {
        with_conn(|conn| {
            create_user(
                conn,
                NewAccount {
                    email: "auth@example.com",
                    password: "test123",
                    name: "",
                },
            )
            .unwrap();

            assert!(authenticate(conn, "auth@EXAMPLE.COM", "test123")
                .unwrap()
                .is_some());
            assert!(authenticate(conn, "auth@example.com", "wrong")
                .unwrap()
                .is_none());
            assert!(authenticate(conn, "nobody@example.com", "test123")
                .unwrap()
                .is_none());
        });
    }

    #[test]
    fn test_update_profile_partial() {
        with_conn(|conn| {
            let user = create_user(
                conn,
                NewAccount {
                    email: "old@example.com",
                    password: "test123",
                    name: "Old Name",
                },
            )
            .unwrap();

            let updated = update_profile(
                conn,
                &user,
                ProfileChanges {
                    name: Some("New Name".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

            assert_eq!(updated.name, "New Name");
            assert_eq!(updated.email, "old@example.com");
            assert_eq!(updated.password_hash, user.password_hash);
        });
    }
}
