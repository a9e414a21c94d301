use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct StepTiming {
    pub name: String,
    pub duration: Duration,
}

/// Per-unit stage durations. Repeated stages (the two transmissions, the two
/// presentation builds) accumulate under one name in the lookup map.
#[derive(Debug, Clone, Default)]
pub struct PipelineTimings {
    steps: Vec<StepTiming>,
    step_map: HashMap<String, Duration>,
}

impl PipelineTimings {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            step_map: HashMap::new(),
        }
    }

    pub fn add_step(&mut self, name: impl Into<String>, duration: Duration) {
        let name = name.into();
        self.steps.push(StepTiming {
            name: name.clone(),
            duration,
        });
        *self.step_map.entry(name).or_insert(Duration::ZERO) += duration;
    }

    /// Runs `f` and records how long it took under `name`.
    pub fn measure<T>(&mut self, name: &str, f: impl FnOnce() -> T) -> T {
        let timer = Timer::start(name);
        let out = f();
        let (name, duration) = timer.stop();
        self.add_step(name, duration);
        out
    }

    pub fn total_duration(&self) -> Duration {
        self.steps.iter().map(|s| s.duration).sum()
    }

    pub fn get_step(&self, name: &str) -> Option<Duration> {
        self.step_map.get(name).copied()
    }

    pub fn steps(&self) -> &[StepTiming] {
        &self.steps
    }

    pub fn summary_lines(&self) -> Vec<String> {
        let total = self.total_duration();
        let mut lines = Vec::with_capacity(self.steps.len() + 1);
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                (step.duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{:<20} {:>12.3}ms ({:>5.1}%)",
                step.name,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            ));
        }
        lines.push(format!(
            "{:<20} {:>12.3}ms",
            "total",
            total.as_secs_f64() * 1000.0
        ));
        lines
    }
}

pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    pub fn stop(self) -> (String, Duration) {
        (self.name, self.start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_steps_accumulate() {
        let mut timings = PipelineTimings::new();
        timings.add_step("transmit", Duration::from_millis(5));
        timings.add_step("resample", Duration::from_millis(2));
        timings.add_step("transmit", Duration::from_millis(7));

        assert_eq!(timings.steps().len(), 3);
        assert_eq!(timings.get_step("transmit"), Some(Duration::from_millis(12)));
        assert_eq!(timings.total_duration(), Duration::from_millis(14));
        assert_eq!(timings.get_step("detect"), None);
    }

    #[test]
    fn test_measure_returns_closure_value() {
        let mut timings = PipelineTimings::new();
        let value = timings.measure("detect", || 41 + 1);
        assert_eq!(value, 42);
        assert!(timings.get_step("detect").is_some());
        assert_eq!(timings.summary_lines().len(), 2);
    }
}
