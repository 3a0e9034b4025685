//! History loading.
//!
//! The host page only renders older turns after it has been scrolled to the
//! top. The loader keeps scrolling up until the scroll height stops growing,
//! then sweeps down once so every lazily rendered section materializes.

use tracing::{debug, info, warn};

use crate::config::LoaderPolicy;
use crate::dom::{Page, ScrollTarget};
use crate::models::{ProgressEvent, ProgressSink, ProgressStatus};

/// Outcome of one loading run
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub target: ScrollTarget,
    pub iterations: usize,
    pub perturbations: usize,
    pub final_scroll_height: f64,
    /// False when the iteration ceiling was hit before the height settled
    pub converged: bool,
    pub sweep_steps: usize,
    /// True when the sweep stopped at `max_sweep_steps` before the bottom
    pub sweep_capped: bool,
}

/// Element with the largest scrollable overflow, or the document root
pub fn find_scroll_container<P: Page + ?Sized>(page: &P, margin: f64) -> ScrollTarget {
    let doc = page.document();
    doc.elements()
        .into_iter()
        .filter_map(|id| {
            let layout = doc.layout(id)?;
            let extent = layout.overflow_extent();
            (layout.overflow_y.is_scrollable() && extent > margin).then_some((id, extent))
        })
        .fold(None, |best: Option<(_, f64)>, (id, extent)| match best {
            Some((_, best_extent)) if best_extent >= extent => best,
            _ => Some((id, extent)),
        })
        .map(|(id, _)| ScrollTarget::Element(id))
        .unwrap_or(ScrollTarget::Root)
}

pub struct HistoryLoader<'a> {
    policy: &'a LoaderPolicy,
}

impl<'a> HistoryLoader<'a> {
    pub fn new(policy: &'a LoaderPolicy) -> Self {
        Self { policy }
    }

    pub fn load<P: Page + ?Sized>(&self, page: &mut P, sink: &mut dyn ProgressSink) -> LoadReport {
        let target = find_scroll_container(page, self.policy.overflow_margin);
        info!(?target, "Loading conversation history");

        let mut iterations = 0;
        let mut stuck = 0;
        let mut perturbations = 0;
        let mut converged = false;

        while iterations < self.policy.max_iterations {
            iterations += 1;
            let before = page.scroll_metrics(target).scroll_height;

            page.scroll_to(target, 0.0);
            page.dispatch_scroll(target);
            page.wait(self.policy.interval());

            let mut after = page.scroll_metrics(target).scroll_height;
            if after > before {
                stuck = 0;
            } else {
                stuck += 1;
            }

            if stuck >= self.policy.stuck_threshold {
                if perturbations >= self.policy.max_perturbations {
                    converged = true;
                } else {
                    perturbations += 1;
                    debug!(iteration = iterations, perturbations, "No growth, perturbing scroll position");
                    self.perturb(page, target);
                    let perturbed = page.scroll_metrics(target).scroll_height;
                    if perturbed > after {
                        after = perturbed;
                        stuck = 0;
                    }
                }
            }

            if iterations % self.policy.progress_every.max(1) == 0 {
                let chars = page.document().visible_text_len();
                sink.send(ProgressEvent::new(
                    ProgressStatus::Loading,
                    format!("Loading history... ({} px, ~{} chars)", after, chars),
                    iterations,
                ));
            }

            if converged {
                break;
            }
        }

        if !converged {
            warn!(iterations, "History loading hit the iteration ceiling");
        }

        let (sweep_steps, sweep_capped) = self.sweep(page, target);
        let final_scroll_height = page.scroll_metrics(target).scroll_height;
        info!(iterations, perturbations, final_scroll_height, converged, "History loaded");

        LoadReport {
            target,
            iterations,
            perturbations,
            final_scroll_height,
            converged,
            sweep_steps,
            sweep_capped,
        }
    }

    /// Nudge the container down and back up to retrigger lazy loading
    fn perturb<P: Page + ?Sized>(&self, page: &mut P, target: ScrollTarget) {
        page.scroll_to(target, self.policy.perturbation_offset);
        page.wait(self.policy.interval());
        page.scroll_to(target, 0.0);
        page.dispatch_scroll(target);
        page.wait(self.policy.interval());
    }

    /// Walk top to bottom a viewport step at a time, then return to the top.
    ///
    /// Returns the steps taken and whether the step ceiling cut the walk short.
    fn sweep<P: Page + ?Sized>(&self, page: &mut P, target: ScrollTarget) -> (usize, bool) {
        let viewport = match target {
            ScrollTarget::Root => page.viewport_height(),
            ScrollTarget::Element(_) => {
                let client = page.scroll_metrics(target).client_height;
                if client > 0.0 { client } else { page.viewport_height() }
            }
        };
        let step = (viewport * self.policy.sweep_step_ratio).max(1.0);

        let mut steps = 0;
        let mut position = 0.0;
        let mut capped = false;
        loop {
            let height = page.scroll_metrics(target).scroll_height;
            if position > height {
                break;
            }
            if steps >= self.policy.max_sweep_steps {
                warn!(steps, height, position, "Sweep hit the step ceiling before the bottom");
                capped = true;
                break;
            }
            page.scroll_to(target, position);
            page.wait(self.policy.sweep_pause());
            steps += 1;
            position += step;
        }
        page.scroll_to(target, 0.0);
        debug!(steps, step, "Sweep complete");
        (steps, capped)
    }
}
