use std::sync::mpsc;
use std::thread;

use crate::error::AppError;

/// A closure running on its own thread whose result is polled from the UI
/// loop without blocking.
pub struct BackgroundTask<T> {
    receiver: Option<mpsc::Receiver<Result<T, AppError>>>,
}

impl<T: Send + 'static> BackgroundTask<T> {
    pub fn spawn<F>(task: F) -> Self
    where
        F: FnOnce() -> Result<T, AppError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(task());
        });
        Self { receiver: Some(rx) }
    }

    /// `Some` exactly once, when the task has finished.
    pub fn try_take(&mut self) -> Option<Result<T, AppError>> {
        let rx = self.receiver.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => Err(AppError::Message(
                "Background task ended without a result".to_string(),
            )),
        };
        self.receiver = None;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;

    fn wait<T: Send + 'static>(task: &mut BackgroundTask<T>) -> Result<T, AppError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = task.try_take() {
                return result;
            }
            assert!(Instant::now() < deadline, "task did not finish");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn delivers_result_once() {
        let mut task = BackgroundTask::spawn(|| Ok(21 * 2));
        assert_eq!(wait(&mut task).unwrap(), 42);
        assert!(task.try_take().is_none());
    }

    #[test]
    fn delivers_errors() {
        let mut task: BackgroundTask<()> =
            BackgroundTask::spawn(|| Err(AppError::Chat("HTTP 502".to_string())));
        assert!(matches!(wait(&mut task), Err(AppError::Chat(_))));
    }

    #[test]
    fn panicking_task_reports_disconnect() {
        let mut task: BackgroundTask<()> = BackgroundTask::spawn(|| panic!("worker blew up"));
        assert!(matches!(wait(&mut task), Err(AppError::Message(_))));
    }
}
