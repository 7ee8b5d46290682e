// src/prompts.rs
//! The model prompt and every user-facing string, kept in one place. The
//! interface speaks Sinhala; the model is asked to answer bilingually.

/// Instruction sent with every image. The answer comes back as free text
/// and is relayed to the caller untouched.
pub const DIAGNOSIS_PROMPT: &str = "You are an expert plant pathologist. Analyze this plant image:
1. Identify the crop and the disease (if any).
2. Give a brief description of the symptoms.
3. Provide practical solutions (Organic and Chemical).
4. VERY IMPORTANT: Provide the final response in both Sinhala and English.
Use a clear, helpful tone for a farmer.";

/// 400 body when no image accompanies the request.
pub const MSG_NO_IMAGE: &str = "පින්තූරයක් ලබා දී නැත";

/// 500 body for any analysis failure. Deliberately generic; the real
/// cause goes to the server log only.
pub const MSG_ANALYSIS_FAILED: &str = "AI පද්ධතියේ දෝෂයක් සිදුවිය. නැවත උත්සාහ කරන්න.";

/// 400 body for an unreadable or empty upload.
pub const MSG_UPLOAD_FAILED: &str = "දෝෂයක් සිදුවිය. කරුණාකර නැවත උත්සාහ කරන්න.";
