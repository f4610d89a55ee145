//! Update command: the CLI face of the version-guarded mutator.

use crate::cli::UpdateArgs;
use crate::config;
use crate::error::Result;
use crate::format::format_issue_line_with;
use crate::storage::{IssuePatch, SqliteStorage};
use tracing::info;

use super::CommandContext;

/// Execute the update command.
///
/// # Errors
///
/// Returns `VersionConflict` when `--expected-version` is stale, or an error
/// if authentication, validation or the lookup of issue/assignee fails.
pub fn execute(args: &UpdateArgs, json: bool, cli: &config::CliOverrides) -> Result<()> {
    let mut ctx = CommandContext::open(json, cli)?;
    let actor = ctx.authenticate()?;

    let patch = build_patch(&ctx.storage, args)?;
    let issue = ctx.storage.update_issue(args.id, &patch, Some(actor.id))?;
    info!(id = issue.id, version = issue.version, "Updated issue");

    if ctx.json {
        super::print_json(&issue)?;
    } else {
        println!(
            "Updated {}",
            format_issue_line_with(&issue, ctx.text_options())
        );
    }
    Ok(())
}

/// Translate flags into a patch. Absent flags leave their field untouched.
fn build_patch(storage: &SqliteStorage, args: &UpdateArgs) -> Result<IssuePatch> {
    let description = if args.clear_description {
        Some(None)
    } else {
        args.description.clone().map(Some)
    };

    let assignee_id = if args.unassign {
        Some(None)
    } else {
        match args.assignee.as_deref() {
            Some(reference) => Some(Some(storage.require_user(reference)?.id)),
            None => None,
        }
    };

    Ok(IssuePatch {
        expected_version: args.expected_version,
        title: args.title.clone(),
        description,
        status: args.status.map(Into::into),
        priority: args.priority.map(Into::into),
        assignee_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{PriorityArg, StatusArg};
    use crate::error::IssueDbError;
    use crate::model::{Priority, Status};
    use crate::storage::NewUser;

    fn args(expected_version: i64) -> UpdateArgs {
        UpdateArgs {
            id: 1,
            expected_version,
            ..UpdateArgs::default()
        }
    }

    #[test]
    fn test_build_patch_only_supplied_fields() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut update = args(4);
        update.status = Some(StatusArg::Resolved);
        update.priority = Some(PriorityArg::High);

        let patch = build_patch(&storage, &update).unwrap();
        assert_eq!(patch.expected_version, 4);
        assert_eq!(patch.status, Some(Status::Resolved));
        assert_eq!(patch.priority, Some(Priority::High));
        assert!(patch.title.is_none());
        assert!(patch.description.is_none());
        assert!(patch.assignee_id.is_none());
    }

    #[test]
    fn test_build_patch_clears_nullable_fields() {
        let storage = SqliteStorage::open_memory().unwrap();
        let mut update = args(1);
        update.clear_description = true;
        update.unassign = true;

        let patch = build_patch(&storage, &update).unwrap();
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.assignee_id, Some(None));
    }

    #[test]
    fn test_build_patch_resolves_assignee() {
        let mut storage = SqliteStorage::open_memory().unwrap();
        let user = storage
            .create_user(&NewUser {
                email: "kim@example.com".to_string(),
                username: "kim".to_string(),
                full_name: None,
            })
            .unwrap();

        let mut update = args(1);
        update.assignee = Some("kim@example.com".to_string());
        let patch = build_patch(&storage, &update).unwrap();
        assert_eq!(patch.assignee_id, Some(Some(user.id)));

        update.assignee = Some("nobody".to_string());
        let err = build_patch(&storage, &update).unwrap_err();
        assert!(matches!(err, IssueDbError::UserNotFound { .. }));
    }
}
