use chrono::NaiveDateTime;
use diesel::prelude::*;
use farmp_sensor::SensorSample;
use serde::Serialize;

/// A stored soil reading. Identity and timestamp are assigned by the
/// store on insert and never change afterwards; everything else may be
/// modified through a [`ReadingPatch`]
#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, PartialEq, Debug)]
#[diesel(table_name = crate::schema::sensor_readings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SensorReading {
    id: i32,
    timestamp: NaiveDateTime,
    humidity: f64,
    ph: f64,
    phosphorus_present: bool,
    potassium_present: bool,
    pump_status: bool,
    /// Advisory output of the irrigation model. May disagree with
    /// `pump_status`, which is what the controller actually did
    predicted_irrigation: Option<bool>,
    prediction_confidence: Option<f64>,
    notes: String,
}

impl SensorReading {
    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn ph(&self) -> f64 {
        self.ph
    }

    pub fn phosphorus_present(&self) -> bool {
        self.phosphorus_present
    }

    pub fn potassium_present(&self) -> bool {
        self.potassium_present
    }

    pub fn pump_status(&self) -> bool {
        self.pump_status
    }

    pub fn predicted_irrigation(&self) -> Option<bool> {
        self.predicted_irrigation
    }

    pub fn prediction_confidence(&self) -> Option<f64> {
        self.prediction_confidence
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    /// The caller supplied part of the reading, for comparing a stored
    /// row against what was inserted
    pub fn as_new_reading(&self) -> NewReading {
        NewReading {
            humidity: self.humidity,
            ph: self.ph,
            phosphorus_present: self.phosphorus_present,
            potassium_present: self.potassium_present,
            pump_status: self.pump_status,
            predicted_irrigation: self.predicted_irrigation,
            prediction_confidence: self.prediction_confidence,
            notes: self.notes.clone(),
        }
    }
}

/// Everything a caller provides when inserting a reading
#[derive(Clone, PartialEq, Debug, Default)]
pub struct NewReading {
    pub humidity: f64,
    pub ph: f64,
    pub phosphorus_present: bool,
    pub potassium_present: bool,
    pub pump_status: bool,
    pub predicted_irrigation: Option<bool>,
    pub prediction_confidence: Option<f64>,
    pub notes: String,
}

impl NewReading {
    pub fn new(
        humidity: f64,
        ph: f64,
        phosphorus_present: bool,
        potassium_present: bool,
        pump_status: bool,
    ) -> Self {
        Self {
            humidity,
            ph,
            phosphorus_present,
            potassium_present,
            pump_status,
            ..Default::default()
        }
    }

    pub fn with_prediction(mut self, predicted_irrigation: bool, confidence: f64) -> Self {
        self.predicted_irrigation = Some(predicted_irrigation);
        self.prediction_confidence = Some(confidence);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }
}

/// Serial imports never carry a model prediction
impl From<SensorSample> for NewReading {
    fn from(sample: SensorSample) -> Self {
        NewReading::new(
            sample.humidity,
            sample.ph,
            sample.phosphorus_present,
            sample.potassium_present,
            sample.pump_status,
        )
        .with_notes(sample.notes)
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sensor_readings)]
pub(crate) struct NewReadingRow<'a> {
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) humidity: f64,
    pub(crate) ph: f64,
    pub(crate) phosphorus_present: bool,
    pub(crate) potassium_present: bool,
    pub(crate) pump_status: bool,
    pub(crate) predicted_irrigation: Option<bool>,
    pub(crate) prediction_confidence: Option<f64>,
    pub(crate) notes: &'a str,
}

impl<'a> NewReadingRow<'a> {
    pub fn new(reading: &'a NewReading, timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp,
            humidity: reading.humidity,
            ph: reading.ph,
            phosphorus_present: reading.phosphorus_present,
            potassium_present: reading.potassium_present,
            pump_status: reading.pump_status,
            predicted_irrigation: reading.predicted_irrigation,
            prediction_confidence: reading.prediction_confidence,
            notes: &reading.notes,
        }
    }
}

/// Partial update of a stored reading. Only fields set to `Some` are
/// written; for the nullable prediction columns `Some(None)` clears the
/// stored value
#[derive(AsChangeset, Clone, PartialEq, Debug, Default)]
#[diesel(table_name = crate::schema::sensor_readings)]
pub struct ReadingPatch {
    pub humidity: Option<f64>,
    pub ph: Option<f64>,
    pub phosphorus_present: Option<bool>,
    pub potassium_present: Option<bool>,
    pub pump_status: Option<bool>,
    pub predicted_irrigation: Option<Option<bool>>,
    pub prediction_confidence: Option<Option<f64>>,
    pub notes: Option<String>,
}

impl ReadingPatch {
    pub fn is_empty(&self) -> bool {
        *self == ReadingPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch() {
        assert!(ReadingPatch::default().is_empty());

        let patch = ReadingPatch {
            prediction_confidence: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn new_reading_from_sample() {
        let sample: SensorSample = "35.5,7.1,NAO,SIM,1,manual note".parse().unwrap();
        let reading = NewReading::from(sample);
        assert_eq!(
            reading,
            NewReading::new(35.5, 7.1, false, true, true).with_notes("manual note")
        );
        assert_eq!(reading.predicted_irrigation, None);
        assert_eq!(reading.prediction_confidence, None);
    }
}
