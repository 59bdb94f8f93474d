use indicatif::{ProgressBar, ProgressStyle};
use skytally_cloud::{CloudError, ProgressSink, UnitCoordinates};

/// Terminal progress for a collection run.
pub struct CollectProgress {
    progress_bar: ProgressBar,
}

impl CollectProgress {
    pub fn new(units: usize) -> Self {
        let pb = ProgressBar::new(units as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message("collecting...");

        Self { progress_bar: pb }
    }

    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
    }
}

impl ProgressSink for CollectProgress {
    fn unit_finished(&self, unit: &UnitCoordinates, outcome: Result<usize, &CloudError>) {
        match outcome {
            Ok(records) => self
                .progress_bar
                .set_message(format!("{} ({} records)", unit, records)),
            Err(e) => self
                .progress_bar
                .println(format!("  ✗ {}: {}", unit, e)),
        }
        self.progress_bar.inc(1);
    }
}
