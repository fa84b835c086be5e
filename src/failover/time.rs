use tokio::time::Duration;

/// Clock is the dispatcher's only source of waiting outside of network I/O.
#[async_trait::async_trait]
pub(crate) trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct RealClock;

#[async_trait::async_trait]
impl Clock for RealClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
