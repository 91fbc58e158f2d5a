//! Persistence of learned action values together with the grid they were learned on

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    ds::{NestedValues, QTable},
    env::Labyrinth,
    Error, Result,
};

/// A grid paired with the Q-table computed against it
///
/// Serialized as JSON of the form
/// `{"grid": [[1, -1]], "q_table": {"0": {"0": {"right": 5.0}, "1": {"left": 0.0}}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub grid: Vec<Vec<i32>>,
    pub q_table: NestedValues,
}

impl Model {
    pub fn new(env: &Labyrinth, q_table: &QTable) -> Self {
        Self {
            grid: env.rows().to_vec(),
            q_table: q_table.to_nested(),
        }
    }

    /// Validate the pairing and split it into a labyrinth and its table
    ///
    /// Fails with [`Error::ModelMismatch`] if the Q-table's shape disagrees with the grid.
    pub fn into_parts(self) -> Result<(Labyrinth, QTable)> {
        let env = Labyrinth::new(self.grid)
            .map_err(|e| Error::mismatch(format!("invalid grid: {e}")))?;
        let q_table = QTable::from_nested(&env, self.q_table)?;
        Ok((env, q_table))
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Save as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .map_err(|e| Error::io(format!("create model file {}", path.display()), e))?;
        let mut writer = BufWriter::new(file);
        self.to_writer(&mut writer)?;
        writer
            .flush()
            .map_err(|e| Error::io(format!("write model file {}", path.display()), e))?;
        info!("saved model to {}", path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::io(format!("open model file {}", path.display()), e))?;
        let model = Self::from_reader(BufReader::new(file))?;
        info!("loaded model from {}", path.display());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Action;

    fn env() -> Labyrinth {
        Labyrinth::new(vec![vec![1, 0], vec![1, -1]]).unwrap()
    }

    #[test]
    fn json_layout() {
        let env = env();
        let model = Model::new(&env, &QTable::new(&env).unwrap());

        let mut buf = Vec::new();
        model.to_writer(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["grid"], serde_json::json!([[1, 0], [1, -1]]));
        assert_eq!(value["q_table"]["0"]["0"]["down"], 0.0);
        assert_eq!(value["q_table"]["1"]["0"]["right"], 0.0);
        assert!(value["q_table"]["0"]["1"].as_object().unwrap().is_empty());

        let parsed = Model::from_reader(buf.as_slice()).unwrap();
        assert_eq!(parsed, model);
    }

    #[test]
    fn into_parts_checks_shape() {
        let env = env();
        let table = QTable::new(&env).unwrap();
        let model = Model::new(&env, &table);

        let (parsed_env, parsed_table) = model.clone().into_parts().unwrap();
        assert_eq!(parsed_env, env);
        assert_eq!(parsed_table, table);

        let mut extra = model.clone();
        extra.q_table.insert(5, Default::default());
        assert!(matches!(
            extra.into_parts(),
            Err(Error::ModelMismatch { .. })
        ));

        let mut narrow = model;
        narrow.grid[1].push(1);
        assert!(matches!(
            narrow.into_parts(),
            Err(Error::ModelMismatch { .. })
        ));
    }

    #[test]
    fn reads_hand_written_json() {
        let text = r#"{
            "grid": [[1, -1]],
            "q_table": {"0": {"0": {"right": 5.0}, "1": {"left": 0.0}}}
        }"#;
        let (_, table) = Model::from_reader(text.as_bytes())
            .unwrap()
            .into_parts()
            .unwrap();
        assert_eq!(table.get((0, 0), Action::Right), Some(5.0));
    }
}
