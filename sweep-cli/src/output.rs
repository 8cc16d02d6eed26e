use weather_sweep_core::{Bucket, MetricAverages, MetricRecord, Snapshot};

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

fn failures(records: &[MetricRecord]) -> usize {
    records.iter().filter(|r| r.is_error()).count()
}

pub fn print_snapshot(snapshot: &Snapshot) {
    let meta = snapshot.meta();
    println!(
        "Snapshot {} ({} districts, {} workers)\n",
        snapshot.last_updated().format("%Y-%m-%d %H:%M:%S UTC"),
        meta.total_districts,
        meta.worker_count,
    );

    println!(
        "{:<18} {:>7} {:>6} {:>7} {:>6} {:>9} {:>9}",
        "district", "temp C", "hum %", "rain mm", "wind", "hist err", "fcst err"
    );
    for d in snapshot.districts() {
        let c = &d.current;
        println!(
            "{:<18} {:>7} {:>6} {:>7} {:>6} {:>9} {:>9}",
            d.district,
            cell(c.temperature_c),
            cell(c.humidity_pct),
            cell(c.rainfall_mm),
            cell(c.wind_speed_ms),
            failures(&d.history),
            failures(&d.forecast),
        );
    }

    println!("\nAverages");
    let averages = snapshot.averages();
    for (bucket, avg) in [
        (Bucket::Current, &averages.current),
        (Bucket::History, &averages.history),
        (Bucket::Forecast, &averages.forecast),
    ] {
        print_averages(bucket, avg);
    }

    println!("\nWorkload (tasks per worker)");
    for bucket in [Bucket::Current, Bucket::History, Bucket::Forecast] {
        let counts = meta
            .workload
            .bucket(bucket)
            .iter()
            .map(|(w, n)| format!("#{w}={n}"))
            .collect::<Vec<_>>()
            .join(" ");
        println!("  {:<9} {counts}", bucket.as_str());
    }

    let errors = snapshot.error_count();
    if errors > 0 {
        println!("\n{errors} task(s) failed; their values are shown as '-'.");
    }
}

fn print_averages(bucket: Bucket, avg: &MetricAverages) {
    println!(
        "  {:<9} temp {:>6} C  humidity {:>5} %  rain {:>5} mm  wind {:>5} m/s",
        bucket.as_str(),
        cell(avg.temperature_c),
        cell(avg.humidity_pct),
        cell(avg.rainfall_mm),
        cell(avg.wind_speed_ms),
    );
}
