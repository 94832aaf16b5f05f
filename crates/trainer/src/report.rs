use std::fmt;

/// Formats seconds as `"<m>m <s>s"`.
pub fn as_minutes(seconds: f64) -> String {
    let m = (seconds / 60.0).floor();
    let s = seconds - m * 60.0;
    format!("{}m {}s", m as i64, s as i64)
}

/// Elapsed time and an estimate of the remaining time given the completed fraction.
pub fn time_since(elapsed: f64, fraction: f64) -> String {
    let estimated = elapsed / fraction;
    let remaining = estimated - elapsed;
    format!("{} (- {})", as_minutes(elapsed), as_minutes(remaining))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    pub elapsed_secs: f64,
    pub iter: usize,
    pub n_iters: usize,
    pub avg_loss: f64,
}

impl fmt::Display for ProgressLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fraction = self.iter as f64 / self.n_iters as f64;
        write!(
            f,
            "{} ({} {}%) {:.4}",
            time_since(self.elapsed_secs, fraction),
            self.iter,
            (fraction * 100.0) as i64,
            self.avg_loss
        )
    }
}

/// Two independent running sums of per-pair loss: one for progress lines,
/// one for the plotted series.
#[derive(Debug, Clone)]
pub struct LossTracker {
    print_every: usize,
    plot_every: usize,
    print_total: f64,
    plot_total: f64,
    seen: usize,
    plot_losses: Vec<f64>,
}

impl LossTracker {
    pub fn new(print_every: usize, plot_every: usize) -> Self {
        Self {
            print_every,
            plot_every,
            print_total: 0.0,
            plot_total: 0.0,
            seen: 0,
            plot_losses: Vec::new(),
        }
    }

    /// Adds one pair's loss. Returns the mean over the print window when it closes.
    pub fn record(&mut self, loss: f64) -> Option<f64> {
        self.seen += 1;
        self.print_total += loss;
        self.plot_total += loss;

        if self.seen % self.plot_every == 0 {
            self.plot_losses.push(self.plot_total / self.plot_every as f64);
            self.plot_total = 0.0;
        }

        if self.seen % self.print_every == 0 {
            let avg = self.print_total / self.print_every as f64;
            self.print_total = 0.0;
            return Some(avg);
        }
        None
    }

    pub fn seen(&self) -> usize {
        self.seen
    }

    pub fn plot_losses(&self) -> &[f64] {
        &self.plot_losses
    }

    pub fn into_plot_losses(self) -> Vec<f64> {
        self.plot_losses
    }
}
