//! The round scheduler's side effects, wired back to the owning [`crate::Engine`]
//! through a `Weak` reference so the scheduler (constructed before the engine
//! it serves) never holds a strong cycle.

use crate::Engine;
use bbs_local::round_scheduler::RoundExecutor;
use std::sync::Weak;

pub struct EngineRoundExecutor {
    pub(crate) engine: Weak<Engine>,
}

#[async_trait::async_trait]
impl RoundExecutor for EngineRoundExecutor {
    async fn refresh_board(&self, board_url: &str) -> bbs_core::Result<()> {
        let Some(engine) = self.engine.upgrade() else {
            return Ok(());
        };
        engine.fetch_subject(board_url).await?;
        Ok(())
    }

    async fn refresh_thread(&self, board_url: &str, thread_id: &str) -> bbs_core::Result<()> {
        let Some(engine) = self.engine.upgrade() else {
            return Ok(());
        };
        engine.fetch_dat(board_url, thread_id).await?;
        Ok(())
    }
}
