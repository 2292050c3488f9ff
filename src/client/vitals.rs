//! Web vitals mapping.
//!
//! Turns batches of performance entries into named metrics:
//! - LCP: last largest-contentful-paint entry of a batch
//! - FID: first first-input entry, processing start minus start
//! - CLS: sum of layout shifts without recent input, reported on page hide
//! - TTFB and PageLoad: from the navigation entry on load

use crate::payload::schema::MetricUnit;
use log::debug;
use parking_lot::Mutex;

/// A named measurement ready for `build_from_performance`
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: &'static str,
    pub value: f64,
    pub unit: MetricUnit,
}

impl Metric {
    fn timing(name: &'static str, value: f64) -> Self {
        Self {
            name,
            value,
            unit: MetricUnit::Milliseconds,
        }
    }
}

/// `largest-contentful-paint` entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargestContentfulPaint {
    pub start_time: f64,
}

/// `first-input` entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstInput {
    pub start_time: f64,
    pub processing_start: f64,
}

/// `layout-shift` entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutShift {
    pub value: f64,
    /// Shift caused by user input; excluded from CLS
    pub had_recent_input: bool,
}

/// `navigation` entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationTiming {
    pub response_start: f64,
    pub load_event_end: f64,
}

/// Holds the running CLS total between layout-shift batches and page hide
#[derive(Debug, Default)]
pub struct VitalsTracker {
    cls: Mutex<f64>,
}

impl VitalsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn largest_contentful_paint(&self, entries: &[LargestContentfulPaint]) -> Option<Metric> {
        entries
            .last()
            .map(|lcp| Metric::timing("LCP", lcp.start_time))
    }

    pub fn first_input(&self, entries: &[FirstInput]) -> Option<Metric> {
        entries
            .first()
            .map(|fid| Metric::timing("FID", fid.processing_start - fid.start_time))
    }

    /// Accumulate shifts that were not user-initiated
    pub fn layout_shift(&self, entries: &[LayoutShift]) {
        let added: f64 = entries
            .iter()
            .filter(|entry| !entry.had_recent_input)
            .map(|entry| entry.value)
            .sum();

        let mut cls = self.cls.lock();
        *cls += added;
        debug!("CLS now {} (+{})", *cls, added);
    }

    pub fn cumulative_layout_shift(&self) -> f64 {
        *self.cls.lock()
    }

    /// CLS summary; nothing when no shift was recorded
    ///
    /// The total is kept, so a later hide reports it again.
    pub fn page_hidden(&self) -> Option<Metric> {
        let cls = self.cumulative_layout_shift();
        (cls > 0.0).then(|| Metric {
            name: "CLS",
            value: cls,
            unit: MetricUnit::Unitless,
        })
    }

    /// TTFB then PageLoad; nothing without a navigation entry
    pub fn page_loaded(&self, navigation: Option<&NavigationTiming>) -> Vec<Metric> {
        navigation
            .map(|nav| {
                vec![
                    Metric::timing("TTFB", nav.response_start),
                    Metric::timing("PageLoad", nav.load_event_end),
                ]
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_lcp_uses_last_entry() {
        let tracker = VitalsTracker::new();
        let metric = tracker
            .largest_contentful_paint(&[
                LargestContentfulPaint { start_time: 800.0 },
                LargestContentfulPaint { start_time: 1400.5 },
            ])
            .unwrap();
        assert_eq!(metric, Metric::timing("LCP", 1400.5));
        assert!(tracker.largest_contentful_paint(&[]).is_none());
    }

    #[test]
    fn test_fid_uses_first_entry() {
        let tracker = VitalsTracker::new();
        let metric = tracker
            .first_input(&[
                FirstInput {
                    start_time: 100.0,
                    processing_start: 112.0,
                },
                FirstInput {
                    start_time: 300.0,
                    processing_start: 400.0,
                },
            ])
            .unwrap();
        assert_eq!(metric.name, "FID");
        assert_eq!(metric.value, 12.0);
    }

    #[test]
    fn test_cls_skips_user_initiated_shifts() {
        let tracker = VitalsTracker::new();
        tracker.layout_shift(&[
            LayoutShift {
                value: 0.05,
                had_recent_input: false,
            },
            LayoutShift {
                value: 0.5,
                had_recent_input: true,
            },
        ]);
        tracker.layout_shift(&[LayoutShift {
            value: 0.025,
            had_recent_input: false,
        }]);

        let metric = tracker.page_hidden().unwrap();
        assert_eq!(metric.name, "CLS");
        assert_eq!(metric.unit, MetricUnit::Unitless);
        assert!((metric.value - 0.075).abs() < 1e-12);
    }

    #[test]
    fn test_cls_zero_is_not_reported() {
        let tracker = VitalsTracker::new();
        tracker.layout_shift(&[LayoutShift {
            value: 0.3,
            had_recent_input: true,
        }]);
        assert!(tracker.page_hidden().is_none());
    }

    #[test]
    fn test_page_loaded() {
        let tracker = VitalsTracker::new();
        assert!(tracker.page_loaded(None).is_empty());

        let metrics = tracker.page_loaded(Some(&NavigationTiming {
            response_start: 180.2,
            load_event_end: 2100.7,
        }));
        assert_eq!(
            metrics,
            vec![
                Metric::timing("TTFB", 180.2),
                Metric::timing("PageLoad", 2100.7)
            ]
        );
    }
}
