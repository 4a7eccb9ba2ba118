use std::convert::Infallible;
use std::time::Duration;

use doorsense_embedded::{UpdateProcedure, UpdateRequest};

/// Stands in for the over-the-air update session: joins the network with
/// the provided credentials and waits for the session to end.
pub struct SimulatedUpdate {
    session: Duration,
}

impl SimulatedUpdate {
    pub fn new(session: Duration) -> Self {
        Self { session }
    }
}

impl UpdateProcedure for SimulatedUpdate {
    type Error = Infallible;

    async fn run(&mut self, request: &UpdateRequest) -> Result<(), Self::Error> {
        let window = Duration::from_millis(request.window.as_millis());
        let session = self.session.min(window);

        tracing::info!(
            "Update mode: joining {:?} as {} for {:?} (window {:?})",
            request.credentials.ssid,
            request.hostname,
            session,
            window
        );
        tokio::time::sleep(session).await;
        tracing::info!("Update session closed");

        Ok(())
    }
}
