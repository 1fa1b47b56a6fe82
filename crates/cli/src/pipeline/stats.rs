//! Pipeline statistics.

use std::time::Duration;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total data frames emitted by the source
    pub frames_emitted: u64,

    /// Missing-frame placeholders emitted by the source
    pub frames_missing: u64,

    /// Frames that passed every check
    pub frames_passed: u64,

    /// Frames with at least one limit violation
    pub frames_failed: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of consumer sinks that received data
    pub active_consumers: usize,
}

impl PipelineStats {
    /// Calculate frames per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            (self.frames_passed + self.frames_failed) as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Calculate failure rate as percentage
    pub fn fail_rate(&self) -> f64 {
        let total = self.frames_passed + self.frames_failed;
        if total > 0 {
            (self.frames_failed as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                   Verification Statistics                    ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Frames emitted: {}", self.frames_emitted);
        println!("   ├─ Frames missing: {}", self.frames_missing);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Active consumers: {}", self.active_consumers);

        println!("\n📈 Verdicts");
        println!("   ├─ Passed: {}", self.frames_passed);
        println!(
            "   └─ Failed: {} ({:.2}%)",
            self.frames_failed,
            self.fail_rate()
        );

        println!();
    }
}
