use crate::classify::{DistanceCategory, classify_entry};
use crate::distance::{DistanceTable, HexId};
use crate::hexagon::HexStyle;

/// Anything that can restyle hexagons `1..=hex_count()`.
pub trait HexSurface {
    fn hex_count(&self) -> usize;
    fn set_style(&mut self, id: HexId, style: HexStyle);
}

/// Outcome of one recoloring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecolorSummary {
    pub classified: usize,
    pub missing: usize,
    pub highlighted: bool,
}

/// Restyle every hexagon from `table`, then highlight `trigger`.
///
/// Hexagons without a finite entry get the `NoData` style. A trigger outside
/// the surface highlights nothing.
pub fn recolor<S: HexSurface + ?Sized>(
    trigger: HexId,
    table: &DistanceTable,
    surface: &mut S,
) -> RecolorSummary {
    let count = surface.hex_count();
    let mut summary = RecolorSummary::default();

    for id in HexId::range(count) {
        let category = classify_entry(table.get(id));
        if category == DistanceCategory::NoData {
            summary.missing += 1;
        } else {
            summary.classified += 1;
        }
        surface.set_style(id, HexStyle::for_category(category));
    }

    if trigger.index() < count {
        surface.set_style(trigger, HexStyle::HIGHLIGHT);
        summary.highlighted = true;
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::hexagon::HexagonSet;
    use crate::hexagon::tests::square;

    fn id(raw: u32) -> HexId {
        HexId::new(raw).expect("non-zero id")
    }

    fn grid(count: usize) -> HexagonSet {
        HexagonSet::from_geometries(
            (0..count)
                .map(|i| square(i as f64, 0.0, 1.0))
                .collect(),
        )
    }

    fn styles(set: &HexagonSet) -> Vec<HexStyle> {
        set.iter().map(|hex| hex.style()).collect()
    }

    /// Records calls in order, to check the highlight lands last.
    struct RecordingSurface {
        count: usize,
        calls: Vec<(HexId, HexStyle)>,
    }

    impl HexSurface for RecordingSurface {
        fn hex_count(&self) -> usize {
            self.count
        }

        fn set_style(&mut self, id: HexId, style: HexStyle) {
            self.calls.push((id, style));
        }
    }

    #[test]
    fn three_hexagon_scenario() {
        let mut set = grid(3);
        let table: DistanceTable = [(id(1), 5.0), (id(2), 45.0), (id(3), 95.0)]
            .into_iter()
            .collect();

        let summary = recolor(id(2), &table, &mut set);

        assert_eq!(
            styles(&set),
            vec![
                HexStyle::for_category(DistanceCategory::Red),
                HexStyle::HIGHLIGHT,
                HexStyle::for_category(DistanceCategory::Purple),
            ]
        );
        assert_eq!(
            summary,
            RecolorSummary {
                classified: 3,
                missing: 0,
                highlighted: true,
            }
        );
    }

    #[test]
    fn every_other_hexagon_matches_its_classification() {
        let mut set = grid(12);
        let table: DistanceTable = HexId::range(12)
            .map(|hex| (hex, hex.get() as f64 * 9.5))
            .collect();

        recolor(id(4), &table, &mut set);

        for hex in set.iter() {
            if hex.id() == id(4) {
                assert_eq!(hex.style(), HexStyle::HIGHLIGHT);
            } else {
                let expected = classify(table.get(hex.id()).unwrap_or(f64::NAN));
                assert_eq!(hex.style(), HexStyle::for_category(expected));
            }
        }
    }

    #[test]
    fn recolor_is_idempotent() {
        let mut set = grid(5);
        let table: DistanceTable = [(id(1), 12.0), (id(2), 0.0), (id(5), 88.0)]
            .into_iter()
            .collect();

        recolor(id(5), &table, &mut set);
        let first = styles(&set);
        recolor(id(5), &table, &mut set);
        assert_eq!(styles(&set), first);
    }

    #[test]
    fn missing_entries_get_no_data_style() {
        let mut set = grid(3);
        let table: DistanceTable = [(id(1), 15.0)].into_iter().collect();

        let summary = recolor(id(1), &table, &mut set);

        let no_data = HexStyle::for_category(DistanceCategory::NoData);
        assert_eq!(styles(&set)[1], no_data);
        assert_eq!(styles(&set)[2], no_data);
        assert_eq!(summary.missing, 2);
        assert_eq!(summary.classified, 1);
    }

    #[test]
    fn highlight_overrides_the_trigger_and_is_applied_last() {
        let mut surface = RecordingSurface {
            count: 2,
            calls: Vec::new(),
        };
        let table: DistanceTable = [(id(1), 5.0), (id(2), 5.0)].into_iter().collect();

        recolor(id(1), &table, &mut surface);

        assert_eq!(surface.calls.len(), 3);
        assert_eq!(surface.calls.last(), Some(&(id(1), HexStyle::HIGHLIGHT)));
    }

    #[test]
    fn trigger_outside_the_grid_highlights_nothing() {
        let mut set = grid(2);
        let table: DistanceTable = [(id(1), 5.0), (id(2), 25.0)].into_iter().collect();

        let summary = recolor(id(9), &table, &mut set);

        assert!(!summary.highlighted);
        assert!(set.iter().all(|hex| hex.style() != HexStyle::HIGHLIGHT));
    }
}
