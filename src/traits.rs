use std::io::Write;

use crate::error::Result;

/// A table with named columns that can be written as CSV.
pub trait Tabular {
    /// The column names, in order.
    fn column_names(&self) -> Vec<String>;

    /// The cells of all rows, formatted as text. Missing cells are written as `missing_token`.
    fn cell_rows(&self, missing_token: &str) -> Vec<Vec<String>>;

    /// Write the table as CSV with a header line.
    fn write_csv<W: Write>(&self, output: W, missing_token: &str) -> Result<()> {
        let mut writer = csv::Writer::from_writer(output);
        writer.write_record(self.column_names())?;
        for row in self.cell_rows(missing_token) {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Render the table as a CSV string, see [`Tabular::write_csv`].
    fn to_csv_string(&self, missing_token: &str) -> Result<String> {
        let mut buffer: Vec<u8> = Vec::new();
        self.write_csv(&mut buffer, missing_token)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
