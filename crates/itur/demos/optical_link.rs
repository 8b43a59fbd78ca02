use itur::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Free-space optical link budget");
    println!("==============================");

    // 1550 nm link over 1 km, 20 mW transmitter, 10 cm receiver aperture
    let pred = Predictor::global();
    let wavelength = Unit::Micrometer.of(1.55);
    let length = Unit::Kilometer.of(1.0);
    let a_geo = pred.geometrical_attenuation(&Unit::Meter.of(0.1), &Unit::Meter.of(1000.0), &Unit::Milliradian.of(2.0))?;
    println!("Geometrical attenuation: {:.2} dB", a_geo.value().unwrap_or(f64::NAN));

    println!();
    println!("Visibility (km) | Suspended particles (dB/km)");
    println!("----------------|----------------------------");
    for v in [0.5, 1.0, 2.0, 5.0, 10.0, 20.0] {
        let gamma = pred.suspended_particles_attenuation(&Unit::Kilometer.of(v), &wavelength)?;
        println!("{:15.1} | {:8.3}", v, gamma.value().unwrap_or(f64::NAN));
    }

    println!();
    println!("Rain rate (mm/h) | Path attenuation (dB)");
    println!("-----------------|----------------------");
    let rates = Unit::MillimeterPerHour.vec(vec![1.0, 5.0, 10.0, 25.0, 50.0]);
    let a_rain = pred.optical_rain_path_attenuation(&rates, &Unit::Dimensionless.of(0.0), &length)?;
    for (r, a) in rates.iter().zip(a_rain.iter()) {
        println!("{:16.1} | {:8.3}", r, a);
    }

    let margin = pred.optical_link_margin(
        &Unit::DecibelMilliwatt.of(13.0),
        &Unit::DecibelMilliwatt.of(-30.0),
        &a_geo,
        &a_rain,
        &Unit::Decibel.of(1.0),
        &Unit::Decibel.of(3.0),
    )?;
    println!();
    println!("Link margin (dB) per rain rate: {:?}", margin.iter().collect::<Vec<_>>());
    Ok(())
}
