use crate::stats::stats_structs::SeasonRow;
use indexmap::IndexMap;

/// Collapses stints of the same player, season and level into one row.
///
/// Counting stats are summed and derived figures (innings, rates) are always
/// recomputed from the sums. First-seen order is preserved.
pub fn combine_stints<T: SeasonRow>(rows: Vec<T>) -> Vec<T> {
    combine_by(rows, |row| (row.player_id(), row.year(), row.level(), 0))
}

/// As [`combine_stints`] but keeps each team a traded player appeared for.
pub fn combine_stints_by_team<T: SeasonRow>(rows: Vec<T>) -> Vec<T> {
    combine_by(rows, |row| (row.player_id(), row.year(), row.level(), row.team_id()))
}

fn combine_by<T, K, F>(rows: Vec<T>, key: F) -> Vec<T>
where
    T: SeasonRow,
    K: std::hash::Hash + Eq,
    F: Fn(&T) -> K
{
    let mut combined: IndexMap<K, T> = IndexMap::with_capacity(rows.len());

    for row in rows {
        match combined.get_mut(&key(&row)) {
            Some(existing) => existing.merge(&row),
            None => {
                combined.insert(key(&row), row);
            }
        }
    }

    combined.into_values().collect()
}
