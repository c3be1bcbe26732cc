#![cfg(feature = "task")]
//! Integration tests for the `task_do!` macro.

use asyncfx::task::Task;
use asyncfx::task_do;
use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum LookupError {
    #[error("user {0} not found")]
    UserNotFound(u32),
    #[error("posts unavailable")]
    PostsUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct User {
    id: u32,
    name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Post {
    author: u32,
    title: String,
}

fn fetch_user(id: u32) -> Task<User, LookupError> {
    Task::from_future(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        if id == 1 {
            Ok(User {
                id,
                name: "ada".to_string(),
            })
        } else {
            Err(LookupError::UserNotFound(id))
        }
    })
}

fn fetch_posts(author: u32) -> Task<Vec<Post>, LookupError> {
    Task::from_future(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        Ok((1..=3)
            .map(|n| Post {
                author,
                title: format!("post {n}"),
            })
            .collect())
    })
}

#[rstest]
#[tokio::test]
async fn test_sequences_dependent_lookups() {
    let summary: Task<String, LookupError> = task_do! {
        user <= fetch_user(1);
        let name = user.name.clone();
        posts <= fetch_posts(user.id);
        Task::complete(format!("{name}: {} posts by {}", posts.len(), posts[0].author))
    };

    assert_eq!(summary.await, Ok("ada: 3 posts by 1".to_string()));
}

#[rstest]
#[tokio::test]
async fn test_failed_step_skips_remaining_steps() {
    let later_steps = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later_steps);

    let summary: Task<usize, LookupError> = task_do! {
        user <= fetch_user(2);
        let reached = counter.fetch_add(1, Ordering::SeqCst) + 1;
        posts <= fetch_posts(user.id);
        Task::complete(posts.len() + reached)
    };

    assert_eq!(summary.await, Err(LookupError::UserNotFound(2)));
    assert_eq!(later_steps.load(Ordering::SeqCst), 0);
}

#[rstest]
#[tokio::test]
async fn test_failure_in_middle_step_becomes_result() {
    let summary: Task<String, LookupError> = task_do! {
        user <= fetch_user(1);
        _ <= Task::<(), LookupError>::failed(LookupError::PostsUnavailable);
        Task::complete(user.name)
    };

    assert_eq!(summary.await, Err(LookupError::PostsUnavailable));
}

#[rstest]
#[tokio::test]
async fn test_steps_run_one_after_another() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));

    let step = |label: &'static str, order: &Arc<std::sync::Mutex<Vec<&'static str>>>| {
        let order = Arc::clone(order);
        Task::<&'static str, LookupError>::from_future(async move {
            order.lock().unwrap().push(label);
            tokio::time::sleep(Duration::from_millis(5)).await;
            order.lock().unwrap().push(label);
            Ok(label)
        })
    };

    let first_order = Arc::clone(&order);
    let second_order = Arc::clone(&order);
    let result: Task<String, LookupError> = task_do! {
        first <= step("first", &first_order);
        second <= step("second", &second_order);
        Task::complete(format!("{first}+{second}"))
    };

    assert_eq!(result.await, Ok("first+second".to_string()));
    assert_eq!(*order.lock().unwrap(), vec!["first", "first", "second", "second"]);
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum PageError {
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),
    #[error("empty page")]
    Empty,
}

#[rstest]
#[case(1, Ok("ada".to_string()))]
#[case(7, Err(PageError::Lookup(LookupError::UserNotFound(7))))]
#[tokio::test]
async fn test_step_errors_convert_into_block_error(
    #[case] id: u32,
    #[case] expected: Result<String, PageError>,
) {
    let page: Task<String, PageError> = task_do! {
        user <= fetch_user(id);
        posts <= fetch_posts(user.id);
        if posts.is_empty() { Err(PageError::Empty) } else { Ok(user.name) }
    };

    assert_eq!(page.await, expected);
}

#[rstest]
#[tokio::test]
async fn test_result_steps_need_no_wrapping() {
    let parsed: Task<i32, String> = task_do! {
        digits <= "12".parse::<i32>().map_err(|e| e.to_string());
        (tens, ones) <= Ok::<_, String>((digits / 10, digits % 10));
        Ok(tens + ones)
    };

    assert_eq!(parsed.await, Ok(3));
}
