use clap::{Parser, ValueEnum};
use geohash_poly::{stream, CellId, Coordinates, Emission, GridCodec, HashMode, HashOptions};
use pretty_duration::pretty_duration;
use serde::Serialize;
use std::{
    io::{self, BufWriter, Write},
    process::ExitCode,
    time::Instant,
};

/// Cover a GeoJSON (multi)polygon with geohash cells.
#[derive(Debug, Parser)]
#[command(name = "geohash-poly", version)]
struct Args {
    /// Polygon or MultiPolygon `coordinates` as JSON, e.g. '[[[0,0],[0,1],[1,1],[1,0],[0,0]]]'
    coords: String,
    /// Geohash length, or bit depth with --integer-mode
    #[arg(short, long, default_value_t = 7)]
    precision: usize,
    #[arg(short = 'm', long, value_enum, default_value_t = ModeArg::Inside)]
    hash_mode: ModeArg,
    /// Minimum overlap fraction for --hash-mode intersect
    #[arg(short, long, default_value_t = 0.0)]
    threshold: f64,
    /// Outer ring vertex count from which polygons are clipped row by row
    #[arg(long, default_value_t = 2000)]
    split_at: usize,
    /// Emit integer cells instead of base32 strings
    #[arg(long)]
    integer_mode: bool,
    /// Pull whole rows at a time
    #[arg(long)]
    row_mode: bool,
    /// Print `hash[,lat,lon]` lines instead of JSON objects
    #[arg(long)]
    csv: bool,
    /// Include the cell centre
    #[arg(long)]
    geocode: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Inside,
    Extent,
    Intersect,
}

impl From<ModeArg> for HashMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Inside => HashMode::Inside,
            ModeArg::Extent => HashMode::Extent,
            ModeArg::Intersect => HashMode::Intersect,
        }
    }
}

impl Args {
    fn options(&self) -> HashOptions {
        HashOptions {
            precision: self.precision,
            row_mode: self.row_mode,
            hash_mode: self.hash_mode.into(),
            threshold: self.threshold,
            split_at: self.split_at,
            integer_mode: self.integer_mode,
        }
    }
}

#[derive(Debug, Serialize)]
struct CellRecord<'a> {
    hash: &'a CellId,
    #[serde(skip_serializing_if = "Option::is_none")]
    lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lon: Option<f64>,
}

impl CellRecord<'_> {
    fn write_csv(&self, out: &mut impl Write) -> io::Result<()> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => writeln!(out, "{},{lat},{lon}", self.hash),
            _ => writeln!(out, "{}", self.hash),
        }
    }
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn run(args: &Args) -> CliResult<()> {
    let coordinates: Coordinates = serde_json::from_str(&args.coords)?;
    let options = args.options();
    log::info!("Covering with {options:?}");

    let start = Instant::now();
    let mut cells = stream(coordinates, &options)?;
    let codec = *cells.scanner().codec();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut total = 0usize;
    for emission in cells.by_ref() {
        let row = match emission? {
            Emission::Row(row) => row,
            Emission::Cell(cell) => vec![cell],
        };
        for cell in &row {
            let centre = if args.geocode {
                Some(codec.decode(cell)?)
            } else {
                None
            };
            let record = CellRecord {
                hash: cell,
                lat: centre.map(|c| c.y),
                lon: centre.map(|c| c.x),
            };
            if args.csv {
                record.write_csv(&mut out)?;
            } else {
                serde_json::to_writer(&mut out, &record)?;
                writeln!(out)?;
            }
        }
        total += row.len();
    }
    out.flush()?;
    log::info!(
        "Produced {} cells in {} rows after {}",
        total,
        cells.rows_emitted(),
        pretty_duration(&start.elapsed(), None)
    );
    Ok(())
}

pub fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("geohash-poly: {e}");
            ExitCode::FAILURE
        }
    }
}
