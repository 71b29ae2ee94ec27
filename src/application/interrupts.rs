#[cfg(test)]
#[path = "interrupts_test.rs"]
mod tests;

use std::process;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    CancelBatch,
    Exit,
}

/// Routes Ctrl-C for the whole session. The first press during a batch stops
/// it after the current card; any other press exits.
#[derive(Clone, Default)]
pub struct Interrupts {
    batch: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    fn active(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        return self
            .batch
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    /// Installs the process wide listener. Once installed, SIGINT no longer
    /// terminates the process by default, so it must stay alive for the session.
    pub fn listen(&self) -> JoinHandle<()> {
        let interrupts = self.clone();
        return tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if interrupts.interrupt() == Interrupt::Exit {
                    tracing::info!("exiting on interrupt");
                    process::exit(130);
                }
            }
        });
    }

    pub fn begin_batch(&self) -> CancellationToken {
        let cancel = CancellationToken::new();
        *self.active() = Some(cancel.clone());
        return cancel;
    }

    pub fn end_batch(&self) {
        *self.active() = None;
    }

    pub fn interrupt(&self) -> Interrupt {
        let active = self.active();
        match active.as_ref() {
            Some(cancel) if !cancel.is_cancelled() => {
                tracing::info!("generation cancelled by user");
                cancel.cancel();
                return Interrupt::CancelBatch;
            }
            _ => return Interrupt::Exit,
        }
    }
}
