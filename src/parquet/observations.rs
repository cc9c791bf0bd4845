//! Save normalized observations to a parquet file.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::Result;
use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, Int32Array, StringArray, UInt16Array, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

use crate::normalize::NormalizedRecord;

pub fn save_observations(records: &[NormalizedRecord], file_path: &Path) -> Result<()> {
    let file = File::create(file_path)?;

    let schema = Arc::new(Schema::new(vec![
        Field::new("station", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("month", DataType::UInt32, false),
        Field::new("day", DataType::UInt32, false),
        Field::new("hour", DataType::UInt32, false),
        Field::new("minute", DataType::UInt32, false),
        Field::new("wind_degrees", DataType::UInt16, true),
        Field::new("wind_speed", DataType::UInt16, true),
        Field::new("wind_gust", DataType::UInt16, true),
        Field::new("visibility", DataType::Float64, true),
        Field::new("ceiling", DataType::UInt32, true),
        Field::new("weather_conditions", DataType::Boolean, false),
    ]));

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

    // Unrecognised visibility encodings are written as null
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.station.as_str()),
        )),
        Arc::new(Int32Array::from_iter_values(records.iter().map(|r| r.year))),
        Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.month))),
        Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.day))),
        Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.hour))),
        Arc::new(UInt32Array::from_iter_values(records.iter().map(|r| r.minute))),
        Arc::new(UInt16Array::from(
            records.iter().map(|r| r.wind_degrees).collect::<Vec<_>>(),
        )),
        Arc::new(UInt16Array::from(
            records.iter().map(|r| r.wind_speed).collect::<Vec<_>>(),
        )),
        Arc::new(UInt16Array::from(
            records.iter().map(|r| r.wind_gust).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            records
                .iter()
                .map(|r| r.visibility.as_ref().ok().copied())
                .collect::<Vec<_>>(),
        )),
        Arc::new(UInt32Array::from(
            records.iter().map(|r| r.ceiling).collect::<Vec<_>>(),
        )),
        Arc::new(BooleanArray::from(
            records
                .iter()
                .map(|r| r.weather_conditions)
                .collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(schema, columns)?;

    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {
    use std::fs;

    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::normalize::NormalizeError;

    fn records_fixture() -> Vec<NormalizedRecord> {
        vec![
            NormalizedRecord {
                station: "KCLM".to_string(),
                year: 2011,
                month: 1,
                day: 1,
                hour: 0,
                minute: 53,
                wind_degrees: Some(270),
                wind_speed: Some(5),
                wind_gust: None,
                visibility: Ok(10.0),
                ceiling: None,
                weather_conditions: false,
            },
            NormalizedRecord {
                station: "KCLM".to_string(),
                year: 2011,
                month: 1,
                day: 1,
                hour: 1,
                minute: 53,
                wind_degrees: None,
                wind_speed: None,
                wind_gust: None,
                visibility: Err(NormalizeError::Visibility("P6SM".to_string())),
                ceiling: Some(800),
                weather_conditions: true,
            },
        ]
    }

    #[test]
    fn should_write_one_row_per_record() {
        let records = records_fixture();
        let temp_file = NamedTempFile::new().unwrap();

        save_observations(&records, temp_file.path()).unwrap();

        let file = fs::File::open(temp_file.path()).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();

        let mut total_rows = 0;
        for batch_result in reader {
            let batch = batch_result.unwrap();
            total_rows += batch.num_rows();

            let schema = batch.schema();
            assert_eq!(schema.fields().len(), 12);
            assert_eq!(schema.field(0).name(), "station");
            assert_eq!(schema.field(9).name(), "visibility");

            let visibility = batch
                .column(9)
                .as_any()
                .downcast_ref::<Float64Array>()
                .unwrap();
            assert_eq!(visibility.value(0), 10.0);
            assert!(visibility.is_null(1));

            assert_eq!(batch.column(6).null_count(), 1);
            assert_eq!(batch.column(10).null_count(), 1);
        }

        assert_eq!(total_rows, 2);
    }

    #[test]
    fn should_write_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();
        save_observations(&[], temp_file.path()).unwrap();

        assert!(fs::metadata(temp_file.path()).unwrap().len() > 0);
    }
}
