use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{self, Duration, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use super::SessionEvent;

/// The once-a-second elapsed-time timer.
///
/// Every start bumps the generation; ticks carry the generation they were
/// produced under so a tick queued by a cancelled timer can be recognised and
/// dropped.
pub struct Ticker {
    period: Duration,
    events: Option<mpsc::WeakUnboundedSender<SessionEvent>>,
    generation: u64,
    active: Option<ActiveTicker>,
}

struct ActiveTicker {
    cancel_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            events: None,
            generation: 0,
            active: None,
        }
    }

    /// Route ticks into a session queue. Without a queue the ticker only tracks
    /// its generation, and ticks are delivered by hand.
    pub fn attach(&mut self, events: &mpsc::UnboundedSender<SessionEvent>) {
        self.events = Some(events.downgrade());
    }

    pub fn start(&mut self) -> u64 {
        self.stop();
        self.generation += 1;

        let cancel_token = CancellationToken::new();
        let handle = self
            .events
            .as_ref()
            .and_then(|weak| weak.upgrade())
            .map(|events| spawn_ticks(self.period, self.generation, events, cancel_token.clone()));

        self.active = Some(ActiveTicker {
            cancel_token,
            handle,
        });
        self.generation
    }

    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel_token.cancel();
            if let Some(handle) = active.handle {
                handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a tick from `generation` belongs to the live timer.
    pub fn accepts(&self, generation: u64) -> bool {
        self.is_running() && generation == self.generation
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_ticks(
    period: Duration,
    generation: u64,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel_token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; the first second has not elapsed yet.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if events.send(SessionEvent::Tick { generation }).is_err() {
                        break;
                    }
                }
                _ = cancel_token.cancelled() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_ticker_tracks_generations() {
        let mut ticker = Ticker::new(Duration::from_secs(1));
        assert!(!ticker.is_running());

        let first = ticker.start();
        assert!(ticker.accepts(first));

        let second = ticker.start();
        assert_ne!(first, second);
        assert!(!ticker.accepts(first));
        assert!(ticker.accepts(second));

        ticker.stop();
        assert!(!ticker.is_running());
        assert!(!ticker.accepts(second));
    }

    #[tokio::test(start_paused = true)]
    async fn attached_ticker_sends_one_tick_per_period() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut ticker = Ticker::new(Duration::from_secs(1));
        ticker.attach(&tx);

        let generation = ticker.start();
        time::sleep(Duration::from_millis(3_500)).await;
        ticker.stop();

        let mut ticks = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                SessionEvent::Tick { generation: g } => {
                    assert_eq!(g, generation);
                    ticks += 1;
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
        assert_eq!(ticks, 3);

        time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
