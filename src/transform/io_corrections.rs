// Readers for the hand-maintained table of corrections.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use serde::Deserialize;

use crate::transform::*;

/// One row of the corrections table, as written by hand.
#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
struct CorrectionRow {
    raw_name: String,
    #[serde(default)]
    include: String,
    #[serde(default)]
    clean_name: String,
    #[serde(default)]
    clean_description: String,
    #[serde(default)]
    clean_geography: String,
    #[serde(default)]
    incumbent: String,
}

impl CorrectionRow {
    fn to_correction(&self) -> Correction {
        let cell = |s: &String| {
            if s.is_empty() {
                None
            } else {
                Some(s.clone())
            }
        };
        Correction {
            include: Inclusion::from_flag(&self.include),
            clean_name: cell(&self.clean_name),
            clean_description: cell(&self.clean_description),
            clean_geography: cell(&self.clean_geography),
            incumbent: cell(&self.incumbent),
        }
    }
}

/// Reads the corrections, from a CSV file or from an Excel workbook (.xlsx).
pub fn read_corrections(path: &Path, worksheet: Option<&str>) -> TResult<CorrectionTable> {
    let path_s = path.display().to_string();
    info!("Attempting to read corrections file {:?}", path_s);
    let is_excel = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    let rows = if is_excel {
        read_excel_rows(&path_s, worksheet)?
    } else {
        read_csv_rows(&path_s)?
    };

    let mut table = CorrectionTable::new();
    for (lineno, row) in rows.iter() {
        if row.raw_name.is_empty() {
            return ParsingCorrectionsSnafu {
                path: path_s,
                lineno: *lineno,
                reason: "empty raw_name",
            }
            .fail();
        }
        if table.insert(&row.raw_name, row.to_correction()).is_some() {
            warn!(
                "read_corrections: line {}: duplicate correction for {:?}, the last one is used",
                lineno, row.raw_name
            );
        }
    }
    info!("Read {} corrections from {:?}", table.len(), path_s);
    Ok(table)
}

fn read_csv_rows(path: &String) -> TResult<Vec<(usize, CorrectionRow)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpeningCorrectionsSnafu { path })?;
    let has_raw_name = rdr
        .headers()
        .context(OpeningCorrectionsSnafu { path })?
        .iter()
        .any(|h| h == "raw_name");
    if !has_raw_name {
        return ParsingCorrectionsSnafu {
            path,
            lineno: 1_usize,
            reason: "missing raw_name column",
        }
        .fail();
    }
    let mut res: Vec<(usize, CorrectionRow)> = Vec::new();
    for (idx, row_r) in rdr.into_deserialize::<CorrectionRow>().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let row = match row_r {
            Ok(row) => row,
            Err(e) => {
                return ParsingCorrectionsSnafu {
                    path,
                    lineno,
                    reason: e.to_string(),
                }
                .fail();
            }
        };
        debug!("read_csv_rows: lineno: {:?} row: {:?}", lineno, row);
        res.push((lineno, row));
    }
    Ok(res)
}

fn read_excel_rows(path: &String, worksheet: Option<&str>) -> TResult<Vec<(usize, CorrectionRow)>> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).context(OpeningCorrectionsExcelSnafu { path })?;
    // A worksheet name was provided, use it. Otherwise take the first one.
    let wrange_o = match worksheet {
        Some(worksheet_name) => workbook.worksheet_range(worksheet_name),
        None => workbook.worksheet_range_at(0),
    };
    let wrange = wrange_o
        .context(EmptyCorrectionsExcelSnafu { path })?
        .context(OpeningCorrectionsExcelSnafu { path })?;

    let mut rows = wrange.rows();
    let header: Vec<String> = match rows.next() {
        Some(cells) => cells
            .iter()
            .enumerate()
            .map(|(col, c)| read_cell(c, path, 1, col))
            .collect::<TResult<Vec<String>>>()?,
        None => return EmptyCorrectionsExcelSnafu { path }.fail(),
    };
    debug!("read_excel_rows: header: {:?}", header);
    let col_index = |name: &str| header.iter().position(|h| h == name);
    let raw_name_idx = match col_index("raw_name") {
        Some(idx) => idx,
        None => {
            return ParsingCorrectionsSnafu {
                path,
                lineno: 1_usize,
                reason: "missing raw_name column",
            }
            .fail()
        }
    };
    let include_idx = col_index("include");
    let clean_name_idx = col_index("clean_name");
    let clean_description_idx = col_index("clean_description");
    let clean_geography_idx = col_index("clean_geography");
    let incumbent_idx = col_index("incumbent");

    let mut res: Vec<(usize, CorrectionRow)> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let lineno = idx + 2;
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(col, c)| read_cell(c, path, lineno, col))
            .collect::<TResult<Vec<String>>>()?;
        // Blank rows are common at the end of edited spreadsheets.
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        let get = |idx_o: Option<usize>| {
            idx_o
                .and_then(|idx| cells.get(idx))
                .cloned()
                .unwrap_or_default()
        };
        let row = CorrectionRow {
            raw_name: get(Some(raw_name_idx)),
            include: get(include_idx),
            clean_name: get(clean_name_idx),
            clean_description: get(clean_description_idx),
            clean_geography: get(clean_geography_idx),
            incumbent: get(incumbent_idx),
        };
        debug!("read_excel_rows: lineno: {:?} row: {:?}", lineno, row);
        res.push((lineno, row));
    }
    Ok(res)
}

fn read_cell(cell: &DataType, path: &String, lineno: usize, col: usize) -> TResult<String> {
    match cell {
        DataType::String(s) => Ok(s.trim().to_string()),
        DataType::Empty => Ok("".to_string()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Ok(format!("{}", *f as i64)),
        DataType::Float(f) => Ok(f.to_string()),
        _ => ParsingCorrectionsSnafu {
            path,
            lineno,
            reason: format!("column {}: could not understand cell {:?}", col + 1, cell),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_csv(contents: &str) -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("corrections.csv");
        fs::write(&p, contents).unwrap();
        (tmp, p)
    }

    #[test]
    fn read_csv() {
        let (_tmp, p) = write_csv(
            "raw_name,include,clean_name,clean_description,clean_geography,incumbent
Messy Title, yes ,Clean Title,About it,Statewide,\"Jane Doe, John Roe\"
Test Race,NO,,,,
",
        );
        let table = read_corrections(&p, None).unwrap();
        assert_eq!(table.len(), 2);
        let messy = table.lookup("Messy Title").unwrap();
        assert_eq!(messy.include, Inclusion::Include);
        assert_eq!(messy.clean_name, Some("Clean Title".to_string()));
        assert_eq!(messy.clean_description, Some("About it".to_string()));
        assert_eq!(messy.lists_incumbent("John Roe"), Some(true));
        assert_eq!(messy.lists_incumbent("Someone Else"), Some(false));

        let test_race = table.lookup("Test Race").unwrap();
        assert_eq!(test_race.include, Inclusion::Exclude);
        assert_eq!(test_race.clean_name, None);
        assert_eq!(test_race.lists_incumbent("Anyone"), None);
    }

    #[test]
    fn optional_columns() {
        let (_tmp, p) = write_csv("raw_name,include\nGovernor,yes\n");
        let table = read_corrections(&p, None).unwrap();
        assert_eq!(
            table.lookup("Governor"),
            Some(&Correction {
                include: Inclusion::Include,
                ..Correction::EMPTY
            })
        );
    }

    #[test]
    fn duplicates_last_wins() {
        let (_tmp, p) = write_csv("raw_name,include,clean_name\nGovernor,yes,First\nGovernor,yes,Second\n");
        let table = read_corrections(&p, None).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup("Governor").unwrap().clean_name,
            Some("Second".to_string())
        );
    }

    #[test]
    fn missing_raw_name() {
        let (_tmp, p) = write_csv("title,include\nGovernor,yes\n");
        assert!(matches!(
            read_corrections(&p, None),
            Err(TransformError::ParsingCorrections { lineno: 1, .. })
        ));

        // No data rows: the header alone is checked.
        let (_tmp, p) = write_csv("title,include\n");
        assert!(matches!(
            read_corrections(&p, None),
            Err(TransformError::ParsingCorrections { lineno: 1, .. })
        ));

        let (_tmp, p) = write_csv("raw_name,include\n");
        assert!(read_corrections(&p, None).unwrap().is_empty());

        let (_tmp, p) = write_csv("raw_name,include\n,yes\n");
        assert!(matches!(
            read_corrections(&p, None),
            Err(TransformError::ParsingCorrections { lineno: 2, .. })
        ));
    }

    #[test]
    fn missing_file() {
        let res = read_corrections(Path::new("/does/not/exist.csv"), None);
        assert!(matches!(
            res,
            Err(TransformError::OpeningCorrections { .. })
        ));
        let res = read_corrections(Path::new("/does/not/exist.xlsx"), None);
        assert!(matches!(
            res,
            Err(TransformError::OpeningCorrectionsExcel { .. })
        ));
    }

    fn workbook_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("testdata")
            .join("corrections.xlsx")
    }

    #[test]
    fn read_excel_first_worksheet() {
        // Columns are mapped by header, in any order. Row 3 is blank.
        let table = read_corrections(&workbook_path(), None).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.lookup("Messy Title"),
            Some(&Correction {
                include: Inclusion::Include,
                clean_name: Some("Clean Title".to_string()),
                clean_description: None,
                clean_geography: None,
                incumbent: Some("Jane Doe".to_string()),
            })
        );
        assert_eq!(
            table.lookup("Test Race").map(|c| c.include),
            Some(Inclusion::Exclude)
        );
        let governor = table.lookup("Governor").unwrap();
        assert_eq!(governor.include, Inclusion::Exclude);
        assert_eq!(
            governor.clean_name,
            Some("Governor of California".to_string())
        );
    }

    #[test]
    fn read_excel_named_worksheet() {
        let table = read_corrections(&workbook_path(), Some("Alternate")).unwrap();
        assert_eq!(table.len(), 1);
        let messy = table.lookup("Messy Title").unwrap();
        assert_eq!(messy.include, Inclusion::Include);
        assert_eq!(messy.clean_geography, Some("Statewide".to_string()));
        assert_eq!(messy.clean_name, None);

        assert!(matches!(
            read_corrections(&workbook_path(), Some("Missing")),
            Err(TransformError::EmptyCorrectionsExcel { .. })
        ));
    }

    #[test]
    fn read_excel_missing_raw_name() {
        assert!(matches!(
            read_corrections(&workbook_path(), Some("NoKey")),
            Err(TransformError::ParsingCorrections { lineno: 1, .. })
        ));
    }

    #[test]
    fn excel_cells() {
        let p = "corrections.xlsx".to_string();
        assert_eq!(
            read_cell(&DataType::String(" Governor ".to_string()), &p, 2, 0).unwrap(),
            "Governor"
        );
        assert_eq!(read_cell(&DataType::Float(3.0), &p, 2, 0).unwrap(), "3");
        assert_eq!(read_cell(&DataType::Int(12), &p, 2, 0).unwrap(), "12");
        assert_eq!(read_cell(&DataType::Empty, &p, 2, 0).unwrap(), "");
        assert!(read_cell(&DataType::Bool(true), &p, 2, 0).is_err());
    }
}
