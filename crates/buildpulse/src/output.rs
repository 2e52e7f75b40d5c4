use buildpulse_core::model::target::Target;
use buildpulse_publish::PublishSummary;
use owo_colors::OwoColorize;

pub fn print_summary_human(v: &PublishSummary) {
    println!("points={}", v.points);
    for target in &v.written {
        println!("{} {target}", "written".green());
    }
    for target in &v.failed {
        println!("{} {target}", "failed".red());
    }
    for target in &v.skipped {
        println!("{} {target}", "skipped".yellow());
    }
    println!(
        "-- {} written, {} failed, {} skipped --",
        v.written.len(),
        v.failed.len(),
        v.skipped.len()
    );
}

pub fn print_targets_human(targets: &[Target]) {
    if targets.is_empty() {
        println!("no targets configured");
        return;
    }
    for t in targets {
        let mut flags = Vec::new();
        if t.use_proxy {
            flags.push("proxy");
        }
        if t.expose_exceptions {
            flags.push("expose");
        }
        if t.gzip {
            flags.push("gzip");
        }
        let user = t.username.as_deref().unwrap_or("-");
        println!(
            "{} {} db={} rp={} user={} {}",
            t.description.cyan(),
            t.url,
            t.database,
            t.retention_policy,
            user,
            flags.join(",")
        );
    }
}
