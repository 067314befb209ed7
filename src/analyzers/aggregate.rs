use crate::analyzers::types::{AggregatedRow, MetricsTable, SubRegionRecord, TotalsRow};
use crate::analyzers::utility::average;

/// Turns tagged records into a [`MetricsTable`].
///
/// Each record gets a zero-guarded average. Rows are ordered by count
/// descending; equal counts keep their input order. Totals are summed over
/// the rows in their final order, so an empty input yields an all-zero
/// totals row.
pub fn compute_metrics(records: Vec<SubRegionRecord>) -> MetricsTable {
    let mut rows: Vec<AggregatedRow> = records
        .into_iter()
        .map(|r| AggregatedRow {
            average: average(r.amount, r.count),
            name: r.name,
            region: r.region,
            count: r.count,
            amount: r.amount,
        })
        .collect();

    // `sort_by` is stable
    rows.sort_by(|a, b| b.count.cmp(&a.count));

    let count = rows.iter().fold(0u64, |acc, r| acc.saturating_add(r.count));
    let amount: f64 = rows.iter().map(|r| r.amount).sum();

    MetricsTable {
        totals: TotalsRow {
            count,
            amount,
            average: average(amount, count),
        },
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, region: &str, count: u64, amount: f64) -> SubRegionRecord {
        SubRegionRecord {
            name: name.to_string(),
            region: region.to_string(),
            count,
            amount,
        }
    }

    #[test]
    fn test_empty_input_yields_zero_totals() {
        let table = compute_metrics(vec![]);
        assert!(table.rows.is_empty());
        assert_eq!(table.totals, TotalsRow::default());
    }

    #[test]
    fn test_two_region_example() {
        let table = compute_metrics(vec![
            record("X", "A", 10, 1000.0),
            record("Y", "B", 0, 0.0),
        ]);

        assert_eq!(
            table.rows,
            vec![
                AggregatedRow {
                    name: "X".into(),
                    region: "A".into(),
                    count: 10,
                    amount: 1000.0,
                    average: 100.0,
                },
                AggregatedRow {
                    name: "Y".into(),
                    region: "B".into(),
                    count: 0,
                    amount: 0.0,
                    average: 0.0,
                },
            ]
        );
        assert_eq!(
            table.totals,
            TotalsRow {
                count: 10,
                amount: 1000.0,
                average: 100.0,
            }
        );
    }

    #[test]
    fn test_sort_descending_and_stable() {
        let table = compute_metrics(vec![
            record("a", "R", 5, 1.0),
            record("b", "R", 9, 1.0),
            record("c", "R", 5, 2.0),
            record("d", "R", 9, 2.0),
            record("e", "R", 1, 3.0),
        ]);

        let names: Vec<_> = table.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b", "d", "a", "c", "e"]);
        assert!(table.rows.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn test_totals_match_row_sums() {
        let table = compute_metrics(vec![
            record("a", "R", 3, 0.1),
            record("b", "S", 7, 0.2),
            record("c", "T", 11, 0.3),
        ]);

        let count: u64 = table.rows.iter().map(|r| r.count).sum();
        let amount: f64 = table.rows.iter().map(|r| r.amount).sum();
        assert_eq!(table.totals.count, count);
        assert_eq!(table.totals.amount, amount);
        assert_eq!(table.totals.average, amount / count as f64);
    }

    #[test]
    fn test_count_total_saturates() {
        let table = compute_metrics(vec![
            record("a", "R", u64::MAX, 1.0),
            record("b", "R", 5, 1.0),
        ]);
        assert_eq!(table.totals.count, u64::MAX);
        assert_eq!(table.rows[0].name, "a");
    }

    #[test]
    fn test_all_zero_counts_give_zero_total_average() {
        let table = compute_metrics(vec![record("a", "R", 0, 0.0), record("b", "R", 0, 0.0)]);
        assert_eq!(table.totals.count, 0);
        assert_eq!(table.totals.average, 0.0);
        assert!(table.rows.iter().all(|r| r.average == 0.0));
    }
}
