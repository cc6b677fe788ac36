use serde::{Deserialize, Serialize};

/// Plateau learning-rate decay driven by the validation MSE of each epoch.
///
/// An epoch whose MSE beats the best seen so far resets the plateau. Once
/// more than `patience_epochs` epochs have passed without improvement the
/// rate is multiplied by `decay` and the plateau starts over. The rate never
/// increases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LrSchedule {
    pub learning_rate: f64,
    pub decay: f64,
    pub patience_epochs: usize,
    epoch: usize,
    best_mse: Option<f64>,
    best_epoch: usize,
}

impl LrSchedule {
    pub fn new(initial_lr: f64, decay: f64, patience_epochs: usize) -> LrSchedule {
        LrSchedule {
            learning_rate: initial_lr,
            decay,
            patience_epochs,
            epoch: 0,
            best_mse: None,
            best_epoch: 0,
        }
    }

    /// Restarts the schedule at `initial_lr`, forgetting the plateau state.
    pub fn reset(&mut self, initial_lr: f64) {
        *self = LrSchedule::new(initial_lr, self.decay, self.patience_epochs);
    }

    /// Records one completed epoch. Returns `true` when the rate was lowered.
    pub fn end_epoch(&mut self, mse: f64) -> bool {
        self.epoch += 1;
        match self.best_mse {
            Some(best) if mse >= best => {
                if self.epoch > self.best_epoch + self.patience_epochs {
                    self.best_epoch = self.epoch;
                    self.learning_rate *= self.decay;
                    return true;
                }
                false
            }
            _ => {
                self.best_mse = Some(mse);
                self.best_epoch = self.epoch;
                false
            }
        }
    }

    pub fn epochs(&self) -> usize {
        self.epoch
    }
}
