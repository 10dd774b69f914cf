//! Turns loosely-named spreadsheet rows into competitors and match records.
//!
//! Column names are matched case- and punctuation-insensitively against a list
//! of synonyms per field. When none of the key columns of a row can be found by
//! name, the row is read positionally instead.

use tracing::{debug, warn};

use super::table::RawRow;
use super::IngestReport;
use crate::config::LadderConfig;
use crate::ladder::eligibility;
use crate::ladder::timeline::parse_timestamp;
use crate::models::{Arm, Competitor, CompetitorId, MatchRecord};

const ID: &[&str] = &["id", "player id", "player_id"];
const NAME: &[&str] = &["name", "display name", "display_name"];
const WEIGHT_CLASS: &[&str] = &["weight class", "weight_class"];
const ACTIVE: &[&str] = &["active", "currently active?", "currently active"];
const SEED_RANK: &[&str] = &["starting rank", "current_rank"];

const DATE: &[&str] = &["date"];
const TIME: &[&str] = &["time", "timestamp", "datetime"];
const SEQUENCE: &[&str] = &["seq", "order", "sequence"];
const WINNER: &[&str] = &["winner id", "winner_id"];
const LOSER: &[&str] = &["loser id", "loser_id", "looser id", "looser_id"];
const ARM: &[&str] = &["arm?", "arm"];
const BADGE: &[&str] = &["badge?", "badge"];

/// Spreadsheet-style truthiness: true, yes, y or 1.
pub fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "yes" | "y" | "1"
    )
}

/// Lowercase `name`, collapse every run of other characters to `_`, and trim
/// leading and trailing underscores: "Aden W." becomes "aden_w".
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.chars().map(|c| c.to_ascii_lowercase()) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c);
        } else {
            pending_sep = true;
        }
    }
    slug
}

/// Any number, including fractions and exponents; blank or NaN is no sequence.
fn parse_sequence(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|s| !s.is_nan())
}

fn parse_seed_rank(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|r| *r > 0)
}

/// Read one roster row. `row_index` only feeds the anonymous-id fallback.
pub fn competitor_from_row(row: &RawRow, row_index: usize) -> Competitor {
    let mut id = row.get(ID).to_string();
    let mut name = row.get(NAME).to_string();
    let mut class = row.get(WEIGHT_CLASS).to_string();
    let mut active = row.get(ACTIVE).to_string();
    let mut seed = row.get(SEED_RANK).to_string();
    // By header a blank cell means active; by position only a missing one does
    let mut blank_is_active = true;

    if id.is_empty() && name.is_empty() && class.is_empty() {
        id = row.at(0).to_string();
        name = row.at(1).to_string();
        class = row.at(2).to_string();
        active = row.cell(3).unwrap_or("true").to_string();
        seed = row.at(4).to_string();
        blank_is_active = false;
    }

    if id.is_empty() {
        id = slugify(&name);
    }
    if id.is_empty() {
        id = format!("anon_{}", row_index);
    }
    if name.is_empty() {
        name = id.clone();
    }

    Competitor {
        id: CompetitorId::from(id),
        name,
        base_class: class,
        active: (blank_is_active && active.is_empty()) || is_truthy(&active),
        seed_rank: parse_seed_rank(&seed),
    }
}

/// Read one match row. The arm is `None` when the indicator is missing or
/// unrecognized; such records never take part in a replay.
pub fn match_from_row(row: &RawRow, row_index: usize) -> MatchRecord {
    let mut date = row.get(DATE).to_string();
    let time = row.get(TIME);
    let sequence = parse_sequence(row.get(SEQUENCE));
    let mut weight_class = row.get(WEIGHT_CLASS).to_string();
    let mut winner = row.get(WINNER).to_string();
    let mut loser = row.get(LOSER).to_string();
    let mut arm = row.get(ARM).to_string();

    let badge = row.get(BADGE);
    let badge_suppressed = !badge.is_empty() && !is_truthy(badge);

    if date.is_empty() && winner.is_empty() && loser.is_empty() {
        date = row.at(0).to_string();
        weight_class = row.at(1).to_string();
        winner = row.at(2).to_string();
        loser = row.at(3).to_string();
        arm = row.at(4).to_string();
    }

    let when = if time.is_empty() {
        date.clone()
    } else {
        format!("{} {}", date, time)
    };

    MatchRecord {
        arm: Arm::from_indicator(&arm),
        winner: CompetitorId::from(winner),
        loser: CompetitorId::from(loser),
        timestamp: parse_timestamp(&when),
        sequence,
        weight_class,
        row_index,
        badge_suppressed,
    }
}

/// Read the roster, noting competitors that land on no ladder.
pub fn normalize_competitors(
    rows: &[RawRow],
    config: &LadderConfig,
    report: &mut IngestReport,
) -> Vec<Competitor> {
    let competitors: Vec<Competitor> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| competitor_from_row(row, i))
        .collect();

    report.competitors_read = competitors.len();
    for c in &competitors {
        if !c.active {
            report.inactive_competitors += 1;
        }
        if eligibility::base_group_index(config, &c.base_class).is_none() {
            warn!(
                "Competitor {} has unrecognized weight class {:?}; not on any ladder",
                c.id, c.base_class
            );
            report.unplaced_competitors.push(c.id.clone());
        }
    }

    competitors
}

/// Read the match table, dropping rows without a usable arm.
pub fn normalize_matches(rows: &[RawRow], report: &mut IngestReport) -> Vec<MatchRecord> {
    report.matches_read = rows.len();

    let mut matches = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        let record = match_from_row(row, i);
        if record.arm.is_none() {
            debug!("Dropping match row {}: no arm", i);
            report.matches_without_arm += 1;
            continue;
        }
        if record.timestamp.is_none() {
            debug!("Match row {} has no readable date; ordering it first", i);
            report.undated_matches += 1;
        }
        matches.push(record);
    }

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::table::parse_csv;
    use chrono::{TimeZone, Utc};

    fn row(csv: &str) -> RawRow {
        parse_csv(csv).unwrap().remove(0)
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("TRUE"));
        assert!(is_truthy(" y "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("no"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Aden W."), "aden_w");
        assert_eq!(slugify("  Tristan  Cole "), "tristan_cole");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_competitor_by_header_synonyms() {
        let c = competitor_from_row(
            &row("Player ID,Display Name,Weight Class,Currently Active?,Starting Rank\naden_w,Aden,u75kg,yes,2\n"),
            0,
        );

        assert_eq!(c.id.as_str(), "aden_w");
        assert_eq!(c.name, "Aden");
        assert_eq!(c.base_class, "u75kg");
        assert!(c.active);
        assert_eq!(c.seed_rank, Some(2));
    }

    #[test]
    fn test_competitor_defaults() {
        let c = competitor_from_row(&row("name,weight_class,active,current_rank\nYve W,women,,abc\n"), 4);

        assert_eq!(c.id.as_str(), "yve_w");
        assert!(c.active);
        assert_eq!(c.seed_rank, None);
    }

    #[test]
    fn test_competitor_inactive_and_anonymous() {
        let c = competitor_from_row(&row("id,name,weight class,active\n,,Open,no\n"), 7);

        assert_eq!(c.id.as_str(), "anon_7");
        assert_eq!(c.name, "anon_7");
        assert!(!c.active);
    }

    #[test]
    fn test_competitor_positional_fallback() {
        let c = competitor_from_row(&row("A,B,C,D,E\nluke_a,Luke,u85kg,false,1\n"), 0);

        assert_eq!(c.id.as_str(), "luke_a");
        assert_eq!(c.name, "Luke");
        assert_eq!(c.base_class, "u85kg");
        assert!(!c.active);
        assert_eq!(c.seed_rank, Some(1));
    }

    #[test]
    fn test_competitor_positional_blank_active_is_inactive() {
        let blank = competitor_from_row(&row("A,B,C,D,E\nluke_a,Luke,u85kg,,1\n"), 0);
        let missing = competitor_from_row(&row("A,B,C,D,E\nluke_a,Luke,u85kg\n"), 0);

        assert!(!blank.active);
        assert!(missing.active);
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(parse_sequence("2"), Some(2.0));
        assert_eq!(parse_sequence(" 1.5 "), Some(1.5));
        assert_eq!(parse_sequence("-3"), Some(-3.0));
        assert_eq!(parse_sequence("1e2"), Some(100.0));
        assert_eq!(parse_sequence(""), None);
        assert_eq!(parse_sequence("NaN"), None);
        assert_eq!(parse_sequence("first"), None);
    }

    #[test]
    fn test_match_by_header() {
        let m = match_from_row(
            &row("Date,Time,Seq,Weight Class,Winner ID,Looser ID,Arm?,Badge?\n2025-08-22,19:45,3,u75kg,aden_w,luke_a,L,\n"),
            5,
        );

        assert_eq!(m.arm, Some(Arm::Left));
        assert_eq!(m.winner.as_str(), "aden_w");
        assert_eq!(m.loser.as_str(), "luke_a");
        assert_eq!(m.timestamp, Some(Utc.with_ymd_and_hms(2025, 8, 22, 19, 45, 0).unwrap()));
        assert_eq!(m.sequence, Some(3.0));
        assert_eq!(m.weight_class, "u75kg");
        assert_eq!(m.row_index, 5);
        assert!(!m.badge_suppressed);
    }

    #[test]
    fn test_badge_flag() {
        let header = "date,winner_id,loser_id,arm,badge\n";
        let off = match_from_row(&row(&format!("{header}2025-08-22,a,b,R,FALSE\n")), 0);
        let on = match_from_row(&row(&format!("{header}2025-08-22,a,b,R,yes\n")), 0);
        let absent = match_from_row(&row(&format!("{header}2025-08-22,a,b,R,\n")), 0);

        assert!(off.badge_suppressed);
        assert!(!on.badge_suppressed);
        assert!(!absent.badge_suppressed);
    }

    #[test]
    fn test_match_positional_fallback() {
        let m = match_from_row(&row("c1,c2,c3,c4,c5\n22/8/2025,Open,a,b,right\n"), 0);

        assert_eq!(m.arm, Some(Arm::Right));
        assert_eq!(m.weight_class, "Open");
        assert_eq!(m.winner.as_str(), "a");
        assert_eq!(m.timestamp, Some(Utc.with_ymd_and_hms(2025, 8, 22, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_time_column_alone_carries_full_datetime() {
        let m = match_from_row(&row("date,datetime,winner_id,loser_id,arm\n,2025-08-22 08:00,a,b,L\n"), 0);
        assert_eq!(m.timestamp, Some(Utc.with_ymd_and_hms(2025, 8, 22, 8, 0, 0).unwrap()));
    }

    #[test]
    fn test_normalize_matches_counts_drops() {
        let rows = parse_csv(
            "date,winner_id,loser_id,arm\n2025-08-22,a,b,L\n2025-08-22,a,b,\nsometime,c,d,R\n",
        )
        .unwrap();
        let mut report = IngestReport::default();
        let matches = normalize_matches(&rows, &mut report);

        assert_eq!(matches.len(), 2);
        assert_eq!(report.matches_read, 3);
        assert_eq!(report.matches_without_arm, 1);
        assert_eq!(report.undated_matches, 1);
        // Row positions survive the drop
        assert_eq!(matches[1].row_index, 2);
    }

    #[test]
    fn test_normalize_competitors_reports_unplaced() {
        let rows = parse_csv("id,name,weight class,active\na,A,u60kg,yes\nb,B,u65kg,yes\nc,C,Open,no\n").unwrap();
        let mut report = IngestReport::default();
        let competitors = normalize_competitors(&rows, &LadderConfig::default(), &mut report);

        assert_eq!(competitors.len(), 3);
        assert_eq!(report.competitors_read, 3);
        assert_eq!(report.inactive_competitors, 1);
        assert_eq!(report.unplaced_competitors, vec![CompetitorId::from("b")]);
    }
}
