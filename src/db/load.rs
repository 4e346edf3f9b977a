use std::fmt::Write;

use sqlx::PgPool;

use crate::model::DiplomacyState;

/// Load a diplomacy registry into Postgres using COPY FROM STDIN (text format).
///
/// Order respects FK constraints: relations → treaties → signatories and
/// relation links → negotiations. Corps, crises and trends have no foreign keys.
pub async fn load_snapshot(pool: &PgPool, state: &DiplomacyState) -> Result<(), sqlx::Error> {
    // Relations
    {
        let mut buf = String::new();
        for r in state.relations.values() {
            let _ = writeln!(
                buf,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                r.key.low,
                r.key.high,
                r.status.as_str(),
                r.established_day,
                r.trust,
                r.trade_volume,
                r.cultural_affinity,
                r.power_balance,
                opt_u32(r.dissolved_day),
            );
        }
        copy_in(pool, include_str!("../../sql/copy_relations.sql"), &buf).await?;
    }

    // Treaties (before signatories and relation links due to FK)
    {
        let mut buf = String::new();
        for t in state.treaties.values() {
            let _ = writeln!(
                buf,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                t.id,
                escape(&t.name),
                t.treaty_type.as_str(),
                t.status.as_str(),
                t.signed_day,
                opt_u32(t.duration),
                opt_u32(t.renewal_day),
                t.violations.len(),
            );
        }
        copy_in(pool, include_str!("../../sql/copy_treaties.sql"), &buf).await?;
    }

    // Treaty signatories
    {
        let mut buf = String::new();
        for t in state.treaties.values() {
            for &group in &t.signatory_groups {
                let _ = writeln!(
                    buf,
                    "{}\t{}\t{}\t{}",
                    t.id,
                    group,
                    t.compliance_of(group),
                    t.economic_impact.get(&group).copied().unwrap_or(0.0),
                );
            }
        }
        copy_in(pool, include_str!("../../sql/copy_treaty_signatories.sql"), &buf).await?;
    }

    // Relation ↔ treaty links
    {
        let mut buf = String::new();
        for r in state.relations.values() {
            for treaty_id in &r.treaties {
                let _ = writeln!(buf, "{}\t{}\t{}", r.key.low, r.key.high, treaty_id);
            }
        }
        copy_in(pool, include_str!("../../sql/copy_relation_treaties.sql"), &buf).await?;
    }

    // Negotiations
    {
        let mut buf = String::new();
        for n in state.negotiations.values() {
            let _ = writeln!(
                buf,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                n.id,
                n.relation.low,
                n.relation.high,
                n.proposed_treaty_type.as_str(),
                n.phase.as_str(),
                n.started_day,
                n.rounds,
                n.agreement_probability,
            );
        }
        copy_in(pool, include_str!("../../sql/copy_negotiations.sql"), &buf).await?;
    }

    // Diplomatic corps
    {
        let mut buf = String::new();
        for a in state.corps.values() {
            let _ = writeln!(
                buf,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                a.agent_id,
                a.representing_group,
                a.role.as_str(),
                a.assignment_day,
                a.negotiation_skill,
                a.effectiveness_rating,
                a.successful_negotiations,
                a.failed_negotiations,
            );
        }
        copy_in(pool, include_str!("../../sql/copy_diplomatic_agents.sql"), &buf).await?;
    }

    // Crises
    {
        let mut buf = String::new();
        for c in &state.crises {
            let _ = writeln!(
                buf,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                c.id,
                c.trigger.as_str(),
                escape(&c.trigger_event),
                c.pair.low,
                c.pair.high,
                c.day,
                opt_u32(c.resolved_day),
            );
        }
        copy_in(pool, include_str!("../../sql/copy_crises.sql"), &buf).await?;
    }

    // Trends
    {
        let mut buf = String::new();
        for t in state.trends.values() {
            let _ = writeln!(
                buf,
                "{}\t{}\t{}\t{}\t{}\t{}",
                t.day,
                t.average_trust,
                t.peaceful_relations,
                t.hostile_relations,
                t.active_treaties,
                t.open_negotiations,
            );
        }
        copy_in(pool, include_str!("../../sql/copy_trends.sql"), &buf).await?;
    }

    tracing::info!(
        relations = state.relations.len(),
        treaties = state.treaties.len(),
        "loaded diplomacy snapshot for day {}",
        state.current_day
    );
    Ok(())
}

/// Execute a COPY FROM STDIN with the given text-format payload.
async fn copy_in(pool: &PgPool, statement: &str, data: &str) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    let mut copy = conn.copy_in_raw(statement).await?;
    copy.send(data.as_bytes()).await?;
    copy.finish().await?;
    Ok(())
}

/// Escape a string for Postgres COPY text format.
/// Backslash must be escaped first, then the special whitespace characters.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}

/// Render an optional day as a COPY text value (`\N` for NULL).
fn opt_u32(v: Option<u32>) -> String {
    match v {
        Some(n) => n.to_string(),
        None => "\\N".to_string(),
    }
}
