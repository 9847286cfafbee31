use std::env;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use anyhow::anyhow;
use linux_embedded_hal::{Delay, I2cdev};
use mlx90642::{pixel_address, Mlx90642, DEFAULT_ADDRESS};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        return Err(anyhow!("Usage: pixel-map <I2C bus> [camera address]"));
    }
    let address: u8 = match args.get(2) {
        Some(arg) if arg.starts_with("0x") => u8::from_str_radix(arg.split_at(2).1, 16)?,
        Some(arg) => arg.parse()?,
        None => DEFAULT_ADDRESS,
    };
    let bus_path = Path::new(&args[1]);
    let bus = I2cdev::new(bus_path)?;
    let mut camera = Mlx90642::new_at_address(bus, Delay, address);
    let period = Duration::from_millis(u64::from(camera.refresh_rate()?.frame_period_ms()));
    // Wait for a frame boundary so the image isn't torn.
    camera.is_new_frame_available()?;
    while !camera.is_new_frame_available()? {
        sleep(period / 4);
    }
    let mut temperatures = vec![0f32; camera.height() * camera.width()];
    camera.read_frame(&mut temperatures)?;
    let width = camera.width();
    print_temperatures(&temperatures, width);
    println!();
    println!("Sensor temperature: {:.2}℃", camera.sentinel().sensor_temperature());
    println!(
        "First pixel at {:#06X}, last at {:#06X}",
        pixel_address(0).map(u16::from).unwrap_or_default(),
        pixel_address(temperatures.len() - 1)
            .map(u16::from)
            .unwrap_or_default()
    );
    Ok(())
}

fn print_temperatures(temperatures: &[f32], width: usize) {
    for (count, temperature) in temperatures.iter().enumerate() {
        if count % width == 0 {
            println!();
        }
        print!("{:6.1}", temperature);
    }
}
