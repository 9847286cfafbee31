use std::env;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use embedded_hal::blocking::delay::DelayMs;
use embedded_hal::blocking::i2c::{Write, WriteRead};
use linux_embedded_hal::{Delay, I2cdev};
use mlx90642::{Mlx90642, RefreshRate};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 || args.len() > 5 {
        return Err(anyhow!(
            "Three arguments required: <I2C bus> <camera address> <refresh rate> [num_frames]"
        ));
    }
    let address: u8 = if args[2].starts_with("0x") {
        let hex_digits = args[2].split_at(2).1;
        u8::from_str_radix(hex_digits, 16)?
    } else {
        args[2].parse()?
    };
    let bus_path = Path::new(&args[1]);
    let bus = I2cdev::new(bus_path)?;
    let refresh_rate_num: f32 = args[3].parse()?;
    let refresh_rate: RefreshRate = refresh_rate_num.try_into()?;
    let num_frames: usize = if args.len() < 5 {
        (refresh_rate_num * 10f32) as usize
    } else {
        args[4].parse()?
    };
    let mut camera = Mlx90642::new_at_address(bus, Delay, address);
    camera.set_refresh_rate(refresh_rate)?;
    println!("Starting measurements.");
    let instants = find_frequency(&mut camera, num_frames)?;
    // Find the duration between each instant, then calculate some statistics on those durations.
    let durations: Vec<Duration> = instants
        .windows(2)
        .map(|pair| pair[1].duration_since(pair[0]))
        .collect();
    if durations.is_empty() {
        return Err(anyhow!("At least two frames are needed to measure a frame rate"));
    }
    let mut sorted_durations = durations.clone();
    sorted_durations.sort();
    println!(
        "For {}Hz, actual timings (min, max, mean, median):",
        refresh_rate_num
    );
    // The shortest duration is the highest frequency, and vice versa.
    println!("{}", as_frequency(&sorted_durations[sorted_durations.len() - 1]));
    println!("{}", as_frequency(&sorted_durations[0]));
    let mean_duration = durations.iter().sum::<Duration>() / durations.len() as u32;
    println!("{}", as_frequency(&mean_duration));
    let middle = sorted_durations.len() / 2;
    let median = if sorted_durations.len() % 2 == 0 {
        (sorted_durations[middle - 1] + sorted_durations[middle]) / 2
    } else {
        sorted_durations[middle]
    };
    println!("{}", as_frequency(&median));
    Ok(())
}

fn find_frequency<I2C, D>(
    driver: &mut Mlx90642<I2C, D>,
    num_frames: usize,
) -> anyhow::Result<Vec<Instant>>
where
    I2C: Write + WriteRead,
    D: DelayMs<u16>,
    mlx90642::Error<I2C>: std::error::Error + Send + Sync + 'static,
{
    let mut results = Vec::with_capacity(num_frames);
    // Establish a baseline; the first check never reports a new frame.
    driver.is_new_frame_available()?;
    while results.len() < num_frames {
        if driver.is_new_frame_available()? {
            results.push(Instant::now());
        }
    }
    Ok(results)
}

fn as_frequency(duration: &Duration) -> f64 {
    duration.as_secs_f64().recip()
}
