use color_eyre::eyre;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq)]
pub enum Interrupted {
    OsSigInt,
    UserInt,
}

/// Broadcasts the reason the application is shutting down to every main loop
#[derive(Debug, Clone)]
pub struct Terminator {
    interrupt_tx: broadcast::Sender<Interrupted>,
}

impl Terminator {
    pub fn new(interrupt_tx: broadcast::Sender<Interrupted>) -> Self {
        Self { interrupt_tx }
    }

    pub fn terminate(&mut self, interrupted: Interrupted) -> eyre::Result<()> {
        self.interrupt_tx.send(interrupted)?;

        Ok(())
    }
}

async fn terminate_by_os_signal(mut terminator: Terminator) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for the interrupt signal: {}", e);
        return;
    }
    if let Err(e) = terminator.terminate(Interrupted::OsSigInt) {
        tracing::error!("Failed to broadcast the interrupt signal: {}", e);
    }
}

pub fn create_termination() -> (Terminator, broadcast::Receiver<Interrupted>) {
    let (tx, rx) = broadcast::channel(1);
    let terminator = Terminator::new(tx);

    tokio::spawn(terminate_by_os_signal(terminator.clone()));

    (terminator, rx)
}
