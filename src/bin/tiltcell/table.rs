use crate::CliError;

/// A header-bearing comma separated table of numbers, stored by column.
pub struct Table {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl Table {
    pub fn parse(text: &str) -> Result<Self, CliError> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let headers: Vec<String> = lines
            .next()
            .ok_or(CliError::EmptyTable)?
            .split(',')
            .map(|h| h.trim().trim_matches('"').to_string())
            .collect();
        let mut columns = vec![Vec::new(); headers.len()];

        for (row, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split(',').collect();
            if fields.len() != headers.len() {
                return Err(CliError::RaggedRow {
                    row: row + 1,
                    found: fields.len(),
                    expected: headers.len(),
                });
            }
            for (column, field) in columns.iter_mut().zip(fields) {
                let value = field.trim().parse::<f64>().map_err(|_| CliError::BadNumber {
                    row: row + 1,
                    text: field.trim().to_string(),
                })?;
                column.push(value);
            }
        }
        Ok(Self { headers, columns })
    }

    pub fn column(&self, name: &str) -> Result<&[f64], CliError> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| CliError::MissingColumn(name.to_string()))
    }

    /// Column as whole sensor counts.
    pub fn counts(&self, name: &str) -> Result<Vec<i32>, CliError> {
        self.column(name)?
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 {
                    Ok(v as i32)
                } else {
                    Err(CliError::NotACount {
                        column: name.to_string(),
                        row: row + 1,
                    })
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_found_by_name() {
        let table = Table::parse("a,\"b\"\n1,2.5\n3,4\n\n").unwrap();
        assert_eq!(table.column("b").unwrap(), &[2.5, 4.0]);
        assert_eq!(table.counts("a").unwrap(), vec![1, 3]);
        assert!(matches!(table.counts("b"), Err(CliError::NotACount { row: 1, .. })));
        assert!(matches!(table.column("c"), Err(CliError::MissingColumn(_))));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        assert!(matches!(
            Table::parse("a,b\n1\n"),
            Err(CliError::RaggedRow { row: 1, found: 1, expected: 2 })
        ));
    }
}
