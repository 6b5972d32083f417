//! Prompt templates for each revision stage.
//!
//! Pure string formatting with no state. Each function returns the user-role
//! prompt body; the engine pairs it with a system instruction from this
//! module. Prompt wording quality is not a concern of the flow logic, so
//! these are kept as plain templates.

// ============================================================================
// System Instructions
// ============================================================================

pub const TUTOR_SYSTEM_INSTRUCTION: &str =
    "You are an expert educational tutor conducting a progressive revision session.";

pub const CONCLUSION_SYSTEM_INSTRUCTION: &str =
    "You are an expert educational tutor providing a session conclusion.";

// ============================================================================
// Fixed Strings
// ============================================================================

/// User-visible message for an unknown session id.
pub const SESSION_NOT_FOUND: &str =
    "Session not found. Please start a new revision session.";

/// Fallback reply when a stage handler fails mid-turn.
pub const GENERIC_CONTINUATION: &str =
    "I encountered an issue processing that. Let's continue with your revision!";

/// Terminal suggestion appended to every completion reply.
pub const NEXT_SUGGESTED_ACTION: &str =
    "Feel free to start a new session anytime to explore more topics or dive deeper into this one!";

// ============================================================================
// Stage Prompts
// ============================================================================

/// Opening turn: greet, restate the topic, offer quick recap vs deep dive.
pub fn topic_kickoff(topic: &str, topic_content: &str) -> String {
    format!(
        "You are starting a revision session for \"{topic}\".\n\
         \n\
         Kick-off instructions:\n\
         1. Start with a friendly, enthusiastic introduction\n\
         2. Clearly remind the student what topic they are revising\n\
         3. Ask whether they want a \"quick recap\" or a \"deep dive\"\n\
         4. Use emojis and engaging language\n\
         5. Keep it conversational and encouraging\n\
         \n\
         Available content about this topic:\n\
         {topic_content}\n\
         \n\
         Generate an engaging kick-off message following these instructions."
    )
}

/// Explain one chunk of the topic, positioned within the full sequence.
pub fn progressive_recap(
    topic: &str,
    concept_chunk: &str,
    chunk_number: usize,
    total_chunks: usize,
) -> String {
    format!(
        "You are presenting concept chunk {chunk_number} of {total_chunks} for the topic \
         \"{topic}\".\n\
         \n\
         Progressive recap instructions:\n\
         1. Present this ONE sub-concept clearly and engagingly\n\
         2. Use analogies, examples, and illustrations where possible\n\
         3. Break complex ideas into simple terms\n\
         4. End by encouraging the student to ask questions\n\
         5. Keep it conversational and fun\n\
         \n\
         Concept to explain:\n\
         {concept_chunk}\n\
         \n\
         Generate an engaging explanation following these instructions."
    )
}

/// One interactive check question about the most recent concept.
pub fn engaging_question(topic: &str, concept: &str, difficulty: &str) -> String {
    format!(
        "Create an engaging question about \"{concept}\" from the topic \"{topic}\".\n\
         \n\
         Question creation instructions:\n\
         1. Create one interactive question (MCQ, fill-in-the-blank, or true/false)\n\
         2. Difficulty level: {difficulty}\n\
         3. Make it conversational and fun, with clear options if MCQ\n\
         4. Keep it relevant to the concept just explained\n\
         \n\
         Create one engaging question following these instructions."
    )
}

/// A short multi-question quiz over recently covered concepts.
pub fn mini_quiz(topic: &str, concepts: &[String], num_questions: usize) -> String {
    let concepts_text = concepts.join(", ");
    format!(
        "Create a mini-quiz for the topic \"{topic}\" covering these concepts: \
         {concepts_text}\n\
         \n\
         Mini-quiz instructions:\n\
         1. Create {num_questions} varied questions\n\
         2. Mix question types (MCQ, true/false, fill-in-the-blank)\n\
         3. Cover different concepts from the list\n\
         4. Number the questions clearly\n\
         5. Keep it fun and use encouraging language\n\
         \n\
         Generate the mini-quiz following these instructions."
    )
}

/// Encouraging feedback on a free-text quiz answer.
///
/// There is no answer key: judging correctness is left entirely to the
/// generator from the student's raw answer and the quizzed concepts.
pub fn quiz_feedback(topic: &str, user_answer: &str, concepts: &[String]) -> String {
    let concepts_text = concepts.join(", ");
    format!(
        "A student answered a mini-quiz on \"{topic}\" covering: {concepts_text}\n\
         \n\
         Student's answer: {user_answer}\n\
         \n\
         Feedback instructions:\n\
         1. Be encouraging regardless of correctness\n\
         2. Where the answer looks right, celebrate and reinforce the learning\n\
         3. Where it looks off, gently correct and explain why\n\
         4. Keep it conversational and supportive\n\
         5. Offer to explain more if needed\n\
         \n\
         Generate appropriate feedback following these instructions."
    )
}

/// Answer a student question using retrieved context.
pub fn question_handling(user_question: &str, topic: &str, context: &str) -> String {
    format!(
        "The student has asked a question during revision of \"{topic}\".\n\
         \n\
         Student's question: \"{user_question}\"\n\
         Current context: {context}\n\
         \n\
         Question handling instructions:\n\
         1. Answer the question clearly and thoroughly\n\
         2. Relate it back to the current topic\n\
         3. Use simple, understandable language with examples if helpful\n\
         4. Encourage further questions\n\
         \n\
         Generate a helpful response following these instructions."
    )
}

/// Celebrate progress so far and motivate the remaining concepts.
pub fn progress_update(
    topic: &str,
    concepts_completed: usize,
    total_concepts: usize,
    percentage: f64,
) -> String {
    format!(
        "Create a progress update message for the revision session.\n\
         \n\
         Progress details:\n\
         - Topic: {topic}\n\
         - Concepts completed: {concepts_completed}/{total_concepts}\n\
         - Progress percentage: {percentage:.0}%\n\
         \n\
         Progress message instructions:\n\
         1. Celebrate the progress made\n\
         2. Show a clear progress indicator\n\
         3. Motivate for the remaining concepts\n\
         4. Keep it brief but encouraging\n\
         \n\
         Generate a motivating progress message following these instructions."
    )
}

/// Closing summary for a completed session.
pub fn conclusion(
    topic: &str,
    concepts: &[String],
    total_turns: u32,
    duration_minutes: i64,
    completion_rate: f64,
) -> String {
    let concepts_text = concepts.join(", ");
    format!(
        "Create a conclusion message for a revision session on \"{topic}\" that lasted \
         {total_turns} interactions over {duration_minutes} minutes \
         ({completion_rate:.0}% of the planned material).\n\
         \n\
         Concepts covered: {concepts_text}\n\
         \n\
         Conclusion instructions:\n\
         1. Celebrate the completion and the student's dedication\n\
         2. Summarize what was learned\n\
         3. Suggest next steps or related topics\n\
         4. Mention they can start a new session anytime for deeper exploration\n\
         5. Keep it motivating and positive\n\
         \n\
         Generate an encouraging conclusion following these instructions."
    )
}

// ============================================================================
// Tests
// ============================================================================
