//! Response schemas sent with structured-output requests

use serde_json::{json, Value};

fn string_list() -> Value {
    json!({"type": "ARRAY", "items": {"type": "STRING"}})
}

pub fn diagnosis() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {"type": "STRING", "description": "Professional summary of the condition."},
            "recommendations": string_list(),
            "medications": string_list(),
            "specialty": {"type": "STRING"},
            "fullSpeechText": {"type": "STRING"}
        },
        "required": ["summary", "recommendations", "medications", "specialty", "fullSpeechText"]
    })
}

pub fn metrics() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "bloodPressure": {"type": "STRING"},
            "bloodSugar": {"type": "NUMBER"},
            "stressLevel": {"type": "NUMBER"},
            "hemoglobin": {"type": "NUMBER"}
        }
    })
}

pub fn wellness() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {"type": "STRING"},
            "category": {"type": "STRING", "enum": ["Normal", "Medium Risk", "Emergency"]},
            "findings": {
                "type": "OBJECT",
                "properties": {
                    "depression": {"type": "STRING"},
                    "anxiety": {"type": "STRING"},
                    "ptsd": {"type": "STRING"}
                },
                "required": ["depression", "anxiety", "ptsd"]
            },
            "recommendations": string_list()
        },
        "required": ["summary", "category", "findings", "recommendations"]
    })
}

pub fn monthly_plan() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {"type": "STRING"},
            "dietStrategy": {"type": "STRING"},
            "phases": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "phase": {"type": "STRING"},
                        "days": {"type": "STRING"},
                        "focus": {"type": "STRING"},
                        "activities": string_list()
                    },
                    "required": ["phase", "days", "focus", "activities"]
                }
            },
            "doList": string_list(),
            "dontList": string_list(),
            "precautions": string_list()
        },
        "required": ["title", "dietStrategy", "phases", "doList", "dontList", "precautions"]
    })
}

pub fn forecast() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "prediction": {"type": "STRING"},
            "actions": string_list(),
            "riskLevel": {"type": "STRING", "enum": ["Low", "Moderate", "High"]}
        },
        "required": ["prediction", "actions", "riskLevel"]
    })
}

pub fn medicine() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "id": {"type": "STRING"},
            "name": {"type": "STRING"},
            "type": {"type": "STRING"},
            "uses": string_list(),
            "dosage": {"type": "STRING"},
            "price": {"type": "NUMBER"},
            "description": {"type": "STRING"}
        },
        "required": ["name", "type", "uses", "dosage", "price", "description"]
    })
}

pub fn medicine_list() -> Value {
    json!({"type": "ARRAY", "items": medicine()})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnosis_requires_every_field() {
        let required = diagnosis()["required"].as_array().unwrap().len();
        assert_eq!(required, 5);
    }

    #[test]
    fn test_medicine_list_wraps_medicine() {
        assert_eq!(medicine_list()["items"], medicine());
    }
}
