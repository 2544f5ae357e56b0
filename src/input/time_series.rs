//! Code for reading hourly demand and capacity factors.
use super::{input_err_msg, read_csv};
use crate::id::IDCollection;
use crate::model::{CapacityFactorMap, DemandMap};
use crate::technology::{TechnologyID, TechnologyMap};
use crate::time_index::{HOURS_PER_YEAR, HourID, TimeIndex};
use crate::units::{Dimensionless, Energy};
use anyhow::{Context, Result, bail, ensure};
use indexmap::IndexSet;
use log::{debug, warn};
use serde::Deserialize;
use std::path::Path;

const DEMAND_FILE_NAME: &str = "demand.csv";
const CAPACITY_FACTORS_FILE_NAME: &str = "capacity_factors.csv";

/// Represents a row of the demand CSV file
#[derive(PartialEq, Debug, Deserialize)]
struct DemandRaw {
    hour: String,
    demand: Energy,
}

/// Read the demand CSV file.
///
/// The order of the rows defines the model's time index.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The time index and the demand in each hour, or an error.
pub fn read_demand(model_dir: &Path) -> Result<(TimeIndex, DemandMap)> {
    let file_path = model_dir.join(DEMAND_FILE_NAME);
    let demand_csv = read_csv(&file_path)?;
    read_demand_from_iter(demand_csv).with_context(|| input_err_msg(&file_path))
}

fn read_demand_from_iter<I>(iter: I) -> Result<(TimeIndex, DemandMap)>
where
    I: Iterator<Item = DemandRaw>,
{
    let mut demand = DemandMap::new();
    for record in iter {
        ensure!(!record.hour.is_empty(), "Hour cannot be empty");
        ensure!(
            record.demand.is_finite() && record.demand >= Energy(0.0),
            "Demand for hour {} must be a finite, non-negative number",
            record.hour
        );

        let hour = HourID::from(record.hour);
        if demand.insert(hour.clone(), record.demand).is_some() {
            bail!("Duplicate entry for hour {hour}");
        }
    }

    let time_index = TimeIndex::new(demand.keys().cloned())?;
    if time_index.is_full_year() {
        debug!("Time index covers a full year of {HOURS_PER_YEAR} hours");
    } else {
        warn!(
            "Time index has {} hours rather than a full year of {HOURS_PER_YEAR}",
            time_index.len()
        );
    }

    Ok((time_index, demand))
}

/// Read the capacity factors CSV file.
///
/// The file has an `hour` column followed by one column per technology, giving the fraction of
/// installed capacity available in each hour.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `time_index` - The model's hours
/// * `technologies` - The model's generation technologies
pub fn read_capacity_factors(
    model_dir: &Path,
    time_index: &TimeIndex,
    technologies: &TechnologyMap,
) -> Result<CapacityFactorMap> {
    let file_path = model_dir.join(CAPACITY_FACTORS_FILE_NAME);
    read_capacity_factors_from_path(&file_path, time_index, technologies)
        .with_context(|| input_err_msg(&file_path))
}

fn read_capacity_factors_from_path(
    file_path: &Path,
    time_index: &TimeIndex,
    technologies: &TechnologyMap,
) -> Result<CapacityFactorMap> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)?;

    // Columns after the first are technology IDs
    let headers = reader.headers()?.clone();
    ensure!(
        headers.get(0) == Some("hour"),
        "The first column must be named \"hour\""
    );
    let mut column_ids = IndexSet::new();
    for header in headers.iter().skip(1) {
        let id: TechnologyID = technologies
            .get_id_by_str(header)
            .with_context(|| format!("Unknown technology column {header}"))?;
        ensure!(
            column_ids.insert(id),
            "Duplicate column for technology {header}"
        );
    }
    for id in technologies.keys() {
        ensure!(
            column_ids.contains(id),
            "No capacity factor column for technology {id}"
        );
    }

    let mut capacity_factors = CapacityFactorMap::new();
    let mut seen_hours = IndexSet::new();
    for record in reader.records() {
        let record = record?;
        let hour_str = record.get(0).unwrap_or_default();
        let hour = time_index
            .get(hour_str)
            .with_context(|| format!("Hour {hour_str} is not in the demand file"))?;
        ensure!(
            seen_hours.insert(hour.clone()),
            "Duplicate row for hour {hour}"
        );

        for (id, value) in column_ids.iter().zip(record.iter().skip(1)) {
            let value: f64 = value.parse().with_context(|| {
                format!("Invalid capacity factor '{value}' for technology {id} in hour {hour}")
            })?;
            capacity_factors.insert((hour.clone(), id.clone()), Dimensionless(value));
        }
    }
    ensure!(!seen_hours.is_empty(), "CSV file cannot be empty");

    Ok(capacity_factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, technologies};
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn demand_raw(hour: &str, demand: f64) -> DemandRaw {
        DemandRaw {
            hour: hour.into(),
            demand: Energy(demand),
        }
    }

    fn create_capacity_factors_file(dir_path: &Path, contents: &str) -> PathBuf {
        let file_path = dir_path.join(CAPACITY_FACTORS_FILE_NAME);
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "{contents}").unwrap();
        file_path
    }

    #[test]
    fn test_read_demand_from_iter() {
        let iter = [
            demand_raw("jan01_00", 10.0),
            demand_raw("jan01_01", 0.0),
            demand_raw("jan01_02", 5.5),
        ];
        let (time_index, demand) = read_demand_from_iter(iter.into_iter()).unwrap();
        assert_eq!(time_index.len(), 3);
        assert_eq!(time_index.first().to_string(), "jan01_00");
        assert_eq!(demand["jan01_02"], Energy(5.5));
    }

    #[test]
    fn test_read_demand_from_iter_duplicate_hour() {
        let iter = [demand_raw("h1", 10.0), demand_raw("h1", 2.0)];
        assert_error!(
            read_demand_from_iter(iter.into_iter()),
            "Duplicate entry for hour h1"
        );
    }

    #[test]
    fn test_read_demand_from_iter_negative() {
        let iter = [demand_raw("h1", -1.0)];
        assert_error!(
            read_demand_from_iter(iter.into_iter()),
            "Demand for hour h1 must be a finite, non-negative number"
        );
    }

    #[test]
    fn test_read_demand() {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(DEMAND_FILE_NAME)).unwrap();
            writeln!(file, "hour,demand\nh1,10\nh2,12.5").unwrap();
        }

        let (time_index, demand) = read_demand(dir.path()).unwrap();
        assert_eq!(time_index, TimeIndex::hourly(2).unwrap());
        assert_eq!(demand["h2"], Energy(12.5));
    }

    #[rstest]
    fn test_read_capacity_factors(technologies: TechnologyMap) {
        let dir = tempdir().unwrap();
        // Column order need not match technology order
        create_capacity_factors_file(dir.path(), "hour,gas,wind\nh1,1.0,0.5\nh2,0.9,0.25");
        let time_index = TimeIndex::hourly(2).unwrap();

        let capacity_factors =
            read_capacity_factors(dir.path(), &time_index, &technologies).unwrap();
        assert_eq!(capacity_factors.len(), 4);
        assert_eq!(
            capacity_factors[&(HourID::from("h2"), TechnologyID::from("wind"))],
            Dimensionless(0.25)
        );
        assert_eq!(
            capacity_factors[&(HourID::from("h2"), TechnologyID::from("gas"))],
            Dimensionless(0.9)
        );
    }

    #[rstest]
    #[case("hour,wind,gas,coal\nh1,1,1,1", "Unknown technology column coal")]
    #[case("hour,wind\nh1,1", "No capacity factor column for technology gas")]
    #[case("hour,wind,wind,gas\nh1,1,1,1", "Duplicate column for technology wind")]
    #[case("time,wind,gas\nh1,1,1", "The first column must be named \"hour\"")]
    #[case("hour,wind,gas\nh7,1,1", "Hour h7 is not in the demand file")]
    #[case("hour,wind,gas\nh1,1,1\nh1,1,1", "Duplicate row for hour h1")]
    #[case(
        "hour,wind,gas\nh1,high,1",
        "Invalid capacity factor 'high' for technology wind in hour h1"
    )]
    #[case("hour,wind,gas", "CSV file cannot be empty")]
    fn test_read_capacity_factors_bad(
        technologies: TechnologyMap,
        #[case] contents: &str,
        #[case] msg: &str,
    ) {
        let dir = tempdir().unwrap();
        let file_path = create_capacity_factors_file(dir.path(), contents);
        let time_index = TimeIndex::hourly(2).unwrap();
        assert_error!(
            read_capacity_factors_from_path(&file_path, &time_index, &technologies),
            msg
        );
    }
}
