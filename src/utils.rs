use once_cell::sync::Lazy;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

/// Runs `fut` on the ambient runtime when there is one, otherwise on [`RUNTIME`].
pub fn spawn_async<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    match Handle::try_current() {
        Ok(handle) => {
            handle.spawn(fut);
        }
        Err(_) => {
            RUNTIME.spawn(fut);
        }
    }
}

/// Hands `abandoned` to the receiver unless disarmed, so a task that panics
/// or is cancelled still reports back.
struct Delivery<M> {
    tx: mpsc::UnboundedSender<M>,
    abandoned: Option<M>,
}

impl<M> Drop for Delivery<M> {
    fn drop(&mut self) {
        if let Some(msg) = self.abandoned.take() {
            let _ = self.tx.send(msg);
        }
    }
}

/// Runs `fut` in the background and hands its result, mapped through `wrap`,
/// to whoever drains `tx`. The receiving side is the only place state changes.
/// If the task dies first, `abandoned` is delivered instead.
pub fn run_async_to_main<T, M, Fut, W>(tx: mpsc::UnboundedSender<M>, fut: Fut, wrap: W, abandoned: M)
where
    T: Send + 'static,
    M: Send + 'static,
    Fut: std::future::Future<Output = T> + Send + 'static,
    W: FnOnce(T) -> M + Send + 'static,
{
    spawn_async(async move {
        let mut delivery = Delivery {
            tx,
            abandoned: Some(abandoned),
        };
        let res = fut.await;
        delivery.abandoned = None;
        if delivery.tx.send(wrap(res)).is_err() {
            log::debug!("result dropped: receiver is gone");
        }
    });
}

pub fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_explicit_scheme() {
        assert_eq!(normalize_url(" https://story.example "), "https://story.example");
    }

    #[test]
    fn normalize_adds_http() {
        assert_eq!(normalize_url("localhost:3001"), "http://localhost:3001");
    }

    #[tokio::test]
    async fn run_async_to_main_delivers_wrapped_result() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_async_to_main(tx, async { 21 }, |n: i32| n * 2, -1);
        assert_eq!(rx.recv().await, Some(42));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn panicking_task_delivers_the_fallback() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_async_to_main(
            tx,
            async {
                if true {
                    panic!("task blew up");
                }
                21
            },
            |n: i32| n * 2,
            -1,
        );
        assert_eq!(rx.recv().await, Some(-1));
    }
}
