use itur::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Earth-space attenuation - single location");
    println!("=========================================");

    // Ground station in Boston, 22.5 GHz, 60 deg elevation, 1 m dish
    let (lat, lon) = (Unit::Degree.of(42.36), Unit::Degree.of(-71.06));
    let f = Unit::GigaHertz.of(22.5);
    let el = Unit::Degree.of(60.0);
    let d = Unit::Meter.of(1.0);
    let p = Unit::Percent.vec(vec![0.01, 0.1, 1.0, 10.0]);

    let link = LinkParameters::new(&lat, &lon, &f, &el, &p).with_diameter(&d);
    let pred = Predictor::global();
    let b = pred.attenuation_breakdown(&link, Contributions::ALL)?;

    println!("p (%)   | gas   | cloud | rain   | scint | total  (dB)");
    println!("--------|-------|-------|--------|-------|-------");
    for (i, p) in p.iter().enumerate() {
        let at = |q: &Quantity| q.get(&[i]).unwrap_or(f64::NAN);
        println!(
            "{:7.2} | {:5.2} | {:5.2} | {:6.2} | {:5.2} | {:6.2}",
            p,
            at(&b.gas),
            at(&b.cloud),
            at(&b.rain),
            at(&b.scintillation),
            at(&b.total)
        );
    }

    println!();
    let a_001 = Unit::Decibel.of(b.rain.get(&[0]).unwrap_or(0.0));
    let xpd = pred.rain_cross_polarization_discrimination(&a_001, &f, &el, &Unit::Percent.of(0.01), &Unit::Degree.of(45.0))?;
    println!("Rain XPD at 0.01%: {:.2} dB", xpd.value().unwrap_or(f64::NAN));
    Ok(())
}
