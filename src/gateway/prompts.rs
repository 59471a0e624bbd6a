//! System instructions and prompt templates for the AI service

/// Persona for every clinical request
pub const CLINICAL_SYSTEM_INSTRUCTION: &str = "You are Dr. Rishu, a world-class Chief Medical Consultant at MediZen. You are authoritative, highly experienced, and professional. Your clinical reasoning follows the SOAP methodology. For structured requests, adhere strictly to the JSON schema provided.";

/// Technical support bot
pub const SUPPORT_SYSTEM_INSTRUCTION: &str = "You are MZ-1, technical support for MediZen.";

pub const PSYCHIATRIST_SYSTEM_INSTRUCTION: &str = "You are a world-class psychiatrist. Analyze psychological indices (PHQ9, GAD7, PTSD) and provide clinical findings.";

pub const STRATEGIST_SYSTEM_INSTRUCTION: &str =
    "You are a Chief Clinical Strategist. Create a detailed 30-day medical roadmap.";

/// Persona for live voice calls
pub const LIVE_SYSTEM_INSTRUCTION: &str = "You are Dr. Rishu, the MediZen voice consultant. Speak calmly and briefly, ask one follow-up question at a time, and advise an in-person visit for anything urgent.";

pub const ANALYZE_DOCUMENT_PROMPT: &str = "Analyze this medical document. Output JSON.";

pub const MEDICINE_IMAGE_PROMPT: &str = "Identify the pharmaceutical product in this image and provide clinical data including uses and dosage.";

pub const EXTRACT_MEDICINES_PROMPT: &str = "Identify all medications mentioned in this clinical report. For each, extract its name, class (type), uses, recommended dosage, and a brief description. Assign a representative market price in INR.";

pub fn extract_metrics(text: &str) -> String {
    format!("Extract health metrics: \"{}\"", text)
}

pub fn formal_report(patient: &str, analysis_json: &str) -> String {
    format!("Generate clinical report for {}. Data: {}", patient, analysis_json)
}

pub fn diagnose(patient: &str, symptoms: &str, mode: &str) -> String {
    format!(
        "Diagnose patient {}. Symptoms: {}. Mode: {}.",
        patient, symptoms, mode
    )
}

pub fn monthly_plan(history_json: &str) -> String {
    format!(
        "Generate a comprehensive 30-day health protocol based on this clinical history: {}. \
         Ensure all fields in the schema are populated with actionable medical-grade advice. \
         Do not return empty lists for doList or dontList.",
        history_json
    )
}

pub fn wellness(patient: &str, scores_json: &str) -> String {
    format!(
        "Analyze neuro-wellness data for {}: {}. Follow the provided schema strictly.",
        patient, scores_json
    )
}

pub fn forecast(context_json: &str) -> String {
    format!("Forecast: {}", context_json)
}

pub fn find_clinics(specialty: &str) -> String {
    format!(
        "Find top rated {} clinics or doctors nearby. Provide current and accurate information.",
        specialty
    )
}

pub fn identify_medicine(name: &str) -> String {
    format!(
        "Identify this medicine and provide its clinical profile: {}",
        name
    )
}

pub fn suggest_medicines(query: &str) -> String {
    format!(
        "Suggest appropriate over-the-counter or common medicines for: {}. Return a list of objects.",
        query
    )
}
