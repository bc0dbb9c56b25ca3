use serde::Serialize;

use crate::executor::BatchResult;
use crate::queue::OperationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    fn success(message: String) -> Self {
        Self {
            level: NotificationLevel::Success,
            message,
        }
    }

    fn error(message: String) -> Self {
        Self {
            level: NotificationLevel::Error,
            message,
        }
    }
}

fn verbs(kind: OperationKind) -> (&'static str, &'static str) {
    match kind {
        OperationKind::Move => ("move", "moved"),
        OperationKind::Copy => ("copy", "copied"),
        OperationKind::Delete => ("delete", "deleted"),
        OperationKind::Restore => ("restore", "restored"),
    }
}

fn items(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}

pub fn summarize(kind: OperationKind, result: &BatchResult) -> Vec<Notification> {
    let (infinitive, past) = verbs(kind);
    let succeeded = result.succeeded.len();
    let mut notifications = Vec::new();

    match result.failed.as_slice() {
        [] => {}
        [single] => notifications.push(Notification::error(format!(
            "Failed to {infinitive} \"{}\": {}",
            single.resource_name(),
            single.error
        ))),
        failed => notifications.push(Notification::error(format!(
            "Failed to {infinitive} {}",
            items(failed.len())
        ))),
    }

    if succeeded > 0 {
        let message = match (result.has_failures(), result.succeeded.as_slice()) {
            (false, [only]) => format!("\"{}\" {past}", only.operation.resource_name()),
            _ => format!("{} {past}", items(succeeded)),
        };
        notifications.push(Notification::success(capitalize(&message)));
    }
    notifications
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{FailedOperation, SucceededOperation};
    use crate::queue::BatchOperation;
    use remote_core::{RemoteError, Resource, ResourceType};

    fn file(name: &str) -> Resource {
        Resource::new(name, format!("/Docs/{name}"), ResourceType::File, "personal")
    }

    fn succeeded(name: &str) -> SucceededOperation {
        SucceededOperation {
            operation: BatchOperation::delete(file(name)),
            resource: file(name),
        }
    }

    fn failed(name: &str) -> FailedOperation {
        FailedOperation {
            operation: BatchOperation::delete(file(name)),
            error: RemoteError::Api {
                status: 403,
                message: "forbidden".into(),
            },
        }
    }

    #[test]
    fn full_success_is_a_single_notification() {
        let result = BatchResult {
            succeeded: vec![succeeded("a.txt"), succeeded("b.txt")],
            failed: vec![],
        };
        assert_eq!(
            summarize(OperationKind::Move, &result),
            vec![Notification::success("2 items moved".into())]
        );

        let single = BatchResult {
            succeeded: vec![succeeded("a.txt")],
            failed: vec![],
        };
        assert_eq!(summarize(OperationKind::Copy, &single)[0].message, "\"a.txt\" copied");
    }

    #[test]
    fn single_failure_names_the_item_and_partial_success_is_reported() {
        let result = BatchResult {
            succeeded: vec![succeeded("a.txt")],
            failed: vec![failed("b.txt")],
        };
        let notifications = summarize(OperationKind::Delete, &result);
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].level, NotificationLevel::Error);
        assert!(notifications[0].message.starts_with("Failed to delete \"b.txt\""));
        assert_eq!(notifications[1], Notification::success("1 item deleted".into()));
    }

    #[test]
    fn several_failures_use_plural_wording() {
        let result = BatchResult {
            succeeded: vec![],
            failed: vec![failed("a.txt"), failed("b.txt")],
        };
        assert_eq!(
            summarize(OperationKind::Restore, &result),
            vec![Notification::error("Failed to restore 2 items".into())]
        );
        assert!(summarize(OperationKind::Restore, &BatchResult::default()).is_empty());
    }
}
