use itur::*;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Rainfall rate exceeded for 0.01% of the year");
    println!("============================================");

    let (lat, lon) = LatLonGrid::new(15.0).with_bounds(-60.0, 60.0, -180.0, 165.0).build()?;
    let pred = Predictor::global();
    let r001 = pred.rainfall_rate(&lat, &lon, &Unit::Percent.of(0.01))?;

    let shape = r001.shape().to_vec();
    print!("lat\\lon");
    for j in 0..shape[1] {
        print!("{:6.0}", lon.get(&[0, j]).unwrap_or(f64::NAN));
    }
    println!();
    for i in 0..shape[0] {
        print!("{:7.0}", lat.get(&[i, 0]).unwrap_or(f64::NAN));
        for j in 0..shape[1] {
            print!("{:6.1}", r001.get(&[i, j]).unwrap_or(f64::NAN));
        }
        println!();
    }

    let mean = r001.iter().sum::<f64>() / r001.len() as f64;
    println!();
    println!("Mean R0.01 over {} points: {:.1} mm/h", r001.len(), mean);
    Ok(())
}
