use diesel::prelude::*;
use uuid::Uuid;

use lancer_shared::types::auth::UserType;
use lancer_shared::{AppError, AppResult, ErrorCode};

use crate::models::{Group, User};
use crate::schema::{group_permissions, groups, permissions, user_groups};

pub const ADMIN_GROUP: &str = "Admin";

/// Default groups and the permission codenames each one carries.
pub const DEFAULT_GROUPS: &[(&str, &[&str])] = &[
    (ADMIN_GROUP, &["add_user", "change_user", "delete_user", "view_user"]),
    ("Freelancer", &["change_user", "view_user"]),
    ("Client", &["change_user", "view_user"]),
    ("Moderator", &["change_user", "view_user"]),
];

/// Creates missing default groups and grants their permissions. Safe to rerun.
pub fn ensure_default_groups(conn: &mut PgConnection) -> AppResult<()> {
    conn.transaction(|conn| {
        for (name, codenames) in DEFAULT_GROUPS {
            diesel::insert_into(groups::table)
                .values(groups::name.eq(*name))
                .on_conflict(groups::name)
                .do_nothing()
                .execute(conn)?;

            let group_id: i32 = groups::table
                .filter(groups::name.eq(*name))
                .select(groups::id)
                .first(conn)?;

            let permission_ids: Vec<i32> = permissions::table
                .filter(permissions::codename.eq_any(codenames.iter().copied()))
                .select(permissions::id)
                .load(conn)?;

            if permission_ids.len() != codenames.len() {
                tracing::warn!(group = %name, "some default permissions are missing");
            }

            let rows: Vec<_> = permission_ids
                .into_iter()
                .map(|pid| (group_permissions::group_id.eq(group_id), group_permissions::permission_id.eq(pid)))
                .collect();
            if !rows.is_empty() {
                diesel::insert_into(group_permissions::table)
                    .values(rows)
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }
        }
        Ok::<_, AppError>(())
    })?;

    tracing::info!(count = DEFAULT_GROUPS.len(), "default groups ensured");
    Ok(())
}

pub fn find_group(conn: &mut PgConnection, name: &str) -> AppResult<Group> {
    groups::table
        .filter(groups::name.eq(name))
        .select(Group::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| AppError::new(ErrorCode::GroupNotFound, format!("group '{name}' not found")))
}

/// Adds the user to `group_name`, optionally dropping all current memberships first.
pub fn assign_group(
    conn: &mut PgConnection,
    user_id: Uuid,
    group_name: &str,
    clear_existing: bool,
) -> AppResult<Vec<String>> {
    conn.transaction(|conn| {
        let group = find_group(conn, group_name)?;

        if clear_existing {
            diesel::delete(user_groups::table.filter(user_groups::user_id.eq(user_id)))
                .execute(conn)?;
        }

        diesel::insert_into(user_groups::table)
            .values((user_groups::user_id.eq(user_id), user_groups::group_id.eq(group.id)))
            .on_conflict_do_nothing()
            .execute(conn)?;

        group_names(conn, user_id)
    })
}

/// Registration-time membership. A missing group is logged, not fatal.
pub fn assign_default_group(conn: &mut PgConnection, user_id: Uuid, user_type: UserType) -> AppResult<()> {
    match assign_group(conn, user_id, user_type.default_group(), false) {
        Ok(_) => Ok(()),
        Err(e) if e.code() == Some(ErrorCode::GroupNotFound) => {
            tracing::warn!(user_id = %user_id, group = user_type.default_group(), "default group missing");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Runs `insert` and the default-group assignment in one transaction, so a
/// failed assignment leaves no half-registered account behind.
pub fn create_with_default_group<F>(conn: &mut PgConnection, user_type: UserType, insert: F) -> AppResult<User>
where
    F: FnOnce(&mut PgConnection) -> AppResult<User>,
{
    conn.transaction::<_, AppError, _>(|conn| {
        let user = insert(conn)?;
        assign_default_group(conn, user.id, user_type)?;
        Ok(user)
    })
}

pub fn group_names(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<String>> {
    let names = user_groups::table
        .inner_join(groups::table)
        .filter(user_groups::user_id.eq(user_id))
        .select(groups::name)
        .order(groups::name.asc())
        .load(conn)?;
    Ok(names)
}

/// Permission strings in `users.<codename>` form, deduplicated and sorted.
pub fn permission_names(conn: &mut PgConnection, user_id: Uuid) -> AppResult<Vec<String>> {
    let codenames: Vec<String> = user_groups::table
        .inner_join(group_permissions::table.on(group_permissions::group_id.eq(user_groups::group_id)))
        .inner_join(permissions::table.on(permissions::id.eq(group_permissions::permission_id)))
        .filter(user_groups::user_id.eq(user_id))
        .select(permissions::codename)
        .distinct()
        .order(permissions::codename.asc())
        .load(conn)?;
    Ok(codenames.into_iter().map(|c| format!("users.{c}")).collect())
}

pub fn is_admin(conn: &mut PgConnection, user_id: Uuid) -> AppResult<bool> {
    let count: i64 = user_groups::table
        .inner_join(groups::table)
        .filter(user_groups::user_id.eq(user_id))
        .filter(groups::name.eq(ADMIN_GROUP))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

pub fn require_admin(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    if is_admin(conn, user_id)? {
        Ok(())
    } else {
        Err(AppError::forbidden("you don't have permission to access this resource"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_group_has_every_permission() {
        let (_, admin) = DEFAULT_GROUPS.iter().find(|(n, _)| *n == ADMIN_GROUP).unwrap();
        for (_, perms) in DEFAULT_GROUPS {
            for p in *perms {
                assert!(admin.contains(p), "{p}");
            }
        }
    }

    #[test]
    fn registration_groups_exist() {
        for user_type in [UserType::Client, UserType::Freelancer, UserType::Admin] {
            assert!(DEFAULT_GROUPS.iter().any(|(n, _)| *n == user_type.default_group()));
        }
    }
}
