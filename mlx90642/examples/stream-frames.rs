//! Stream frames to stdout, one line per frame.
//!
//! Each line is a comma before every temperature and a newline at the end, ready to be piped into
//! something else.
use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{anyhow, Context};
use linux_embedded_hal::{Delay, I2cdev};
use mlx90642::{Mlx90642, RefreshRate, DEFAULT_ADDRESS, NUM_PIXELS};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 4 {
        return Err(anyhow!(
            "Usage: stream-frames <I2C bus> [camera address] [refresh rate]"
        ));
    }
    let bus_path = Path::new(&args[1]);
    let address = match args.get(2) {
        Some(arg) => parse_address(arg)?,
        None => DEFAULT_ADDRESS,
    };
    let refresh_rate: RefreshRate = match args.get(3) {
        Some(arg) => arg.parse::<f32>()?.try_into()?,
        None => RefreshRate::default(),
    };
    let bus = I2cdev::new(bus_path)
        .with_context(|| format!("opening {}", bus_path.display()))?;
    let mut camera = Mlx90642::new_at_address(bus, Delay, address);
    camera.set_refresh_rate(refresh_rate)?;
    // Polling twice per frame is enough to catch every wrap of the progress counter.
    let poll_interval = Duration::from_millis(u64::from(refresh_rate.frame_period_ms()) / 2);
    let mut temperatures = [0f32; NUM_PIXELS];
    let stdout = io::stdout();
    loop {
        if camera.is_new_frame_available()? {
            camera.read_frame(&mut temperatures)?;
            let line = camera.render_frame(&temperatures);
            let mut handle = stdout.lock();
            handle.write_all(line)?;
            handle.flush()?;
        } else {
            sleep(poll_interval);
        }
    }
}

fn parse_address(arg: &str) -> anyhow::Result<u8> {
    let address = if let Some(hex_digits) = arg.strip_prefix("0x") {
        u8::from_str_radix(hex_digits, 16)?
    } else {
        arg.parse()?
    };
    Ok(address)
}
