//! Registration writes against a migrated Postgres database.
//!
//! Set `LANCER_TEST_DATABASE_URL` to run these; without it they return early.
//! Each test runs inside a test transaction and leaves nothing behind.

use diesel::prelude::*;

use lancer_shared::types::auth::UserType;
use lancer_shared::ErrorCode;
use lancer_users::models::{NewUser, User};
use lancer_users::schema::{groups, user_groups, users};
use lancer_users::services::group_service;

fn test_connection() -> Option<PgConnection> {
    let url = std::env::var("LANCER_TEST_DATABASE_URL").ok()?;
    let mut conn = PgConnection::establish(&url).expect("connect to test database");
    conn.begin_test_transaction().expect("begin test transaction");
    Some(conn)
}

fn new_client(email: &str) -> NewUser {
    NewUser {
        email: email.to_string(),
        username: email.split('@').next().unwrap_or(email).to_string(),
        password_hash: "not-a-real-hash".to_string(),
        first_name: None,
        last_name: None,
        user_type: UserType::Client.as_str().to_string(),
        phone_number: None,
        profile_picture: None,
        is_verified: false,
    }
}

fn insert_user(conn: &mut PgConnection, email: &str) -> lancer_shared::AppResult<User> {
    Ok(diesel::insert_into(users::table)
        .values(&new_client(email))
        .returning(User::as_returning())
        .get_result(conn)?)
}

fn ensure_client_group(conn: &mut PgConnection) {
    diesel::insert_into(groups::table)
        .values(groups::name.eq(UserType::Client.default_group()))
        .on_conflict_do_nothing()
        .execute(conn)
        .unwrap();
}

fn user_count(conn: &mut PgConnection, email: &str) -> i64 {
    users::table
        .filter(users::email.eq(email))
        .count()
        .get_result(conn)
        .unwrap()
}

#[test]
fn new_account_joins_default_group() {
    let Some(mut conn) = test_connection() else { return };
    ensure_client_group(&mut conn);

    let user = group_service::create_with_default_group(&mut conn, UserType::Client, |conn| {
        insert_user(conn, "grouped-signup@example.com")
    })
    .unwrap();

    let names = group_service::group_names(&mut conn, user.id).unwrap();
    assert_eq!(names, vec![UserType::Client.default_group().to_string()]);
}

#[test]
fn failed_group_assignment_rolls_back_user_row() {
    let Some(mut conn) = test_connection() else { return };
    ensure_client_group(&mut conn);
    // Membership writes now fail after the group lookup succeeds.
    diesel::sql_query("DROP TABLE user_groups").execute(&mut conn).unwrap();

    let email = "half-signup@example.com";
    let err = group_service::create_with_default_group(&mut conn, UserType::Client, |conn| {
        insert_user(conn, email)
    })
    .unwrap_err();

    assert_ne!(err.code(), Some(ErrorCode::GroupNotFound));
    assert_eq!(user_count(&mut conn, email), 0);
}

#[test]
fn missing_default_group_still_creates_account() {
    let Some(mut conn) = test_connection() else { return };
    diesel::delete(user_groups::table).execute(&mut conn).unwrap();
    diesel::sql_query("DELETE FROM group_permissions").execute(&mut conn).unwrap();
    diesel::delete(groups::table.filter(groups::name.eq(UserType::Client.default_group())))
        .execute(&mut conn)
        .unwrap();

    let email = "groupless-signup@example.com";
    group_service::create_with_default_group(&mut conn, UserType::Client, |conn| {
        insert_user(conn, email)
    })
    .unwrap();

    assert_eq!(user_count(&mut conn, email), 1);
}
