// ============================================================
// Layer 5 — Training Callbacks
// ============================================================
// Both callbacks watch the same monitored loss (validation loss,
// or training loss when there is no validation set):
//
//   checkpoint     — save the model whenever the loss improves,
//                    overwriting the previous best
//   early stopping — stop once the loss has not improved for
//                    `patience` consecutive epochs
//
// LossMonitor holds the shared "best so far" state; the trainer
// asks it what to do after every epoch.

/// What the trainer should do after an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// New best loss: snapshot the weights and checkpoint
    SaveBest,
    /// No improvement yet, keep going
    Continue,
    /// Patience exhausted
    Stop,
}

#[derive(Debug, Clone)]
pub struct LossMonitor {
    patience:   usize,
    best_loss:  f64,
    best_epoch: Option<usize>,
    wait:       usize,
}

impl LossMonitor {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            best_loss:  f64::INFINITY,
            best_epoch: None,
            wait:       0,
        }
    }

    /// Record the monitored loss for `epoch`. NaN never counts as
    /// an improvement.
    pub fn observe(&mut self, epoch: usize, loss: f64) -> CallbackAction {
        if loss < self.best_loss {
            self.best_loss  = loss;
            self.best_epoch = Some(epoch);
            self.wait       = 0;
            return CallbackAction::SaveBest;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            CallbackAction::Stop
        } else {
            CallbackAction::Continue
        }
    }

    pub fn best_loss(&self) -> f64 {
        self.best_loss
    }

    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }
}
