//! Prompt templates sent to the generator

const GRADING_TEMPLATE: &str = r#"
คุณเป็นผู้เชี่ยวชาญด้านระบบควบคุม (Control System)

จากความรู้ที่เกี่ยวข้อง:
{context}

คำถาม: {question}

คำตอบของนักศึกษา: {student_answer}

เฉลย/คำตอบที่ถูกต้อง: {reference_answer}

กรุณาตรวจและให้คะแนนคำตอบของนักศึกษา โดย:
1. วิเคราะห์ความถูกต้องของคำตอบ
2. เปรียบเทียบกับเฉลยและความรู้ที่เกี่ยวข้อง
3. ให้คะแนนเป็นเปอร์เซ็นต์ (0-100)
4. ให้คำอธิบาย feedback แนะนำ

ตอบกลับในรูปแบบ JSON:
{
  "score": <คะแนน 0-100>,
  "is_correct": <true/false>,
  "feedback": "<คำอธิบายและข้อเสนอแนะ>",
  "key_points_covered": ["<จุดสำคัญที่ตอบถูก>"],
  "missing_points": ["<จุดที่ขาดหายไป>"]
}
"#;

const QUERY_TEMPLATE: &str = r#"
คุณเป็นผู้เชี่ยวชาญด้านระบบควบคุม (Control System) และต้องตอบเป็นภาษาไทยเท่านั้น

คำถาม: {question}

ข้อมูลที่เกี่ยวข้อง:
{context}

คำแนะนำ:
- ตอบคำถามโดยอ้างอิงจากข้อมูลที่ให้มา
- หากไม่พบข้อมูลที่เกี่ยวข้อง ให้บอกว่าไม่มีข้อมูล
- ตอบเป็นภาษาไทยเท่านั้น
- ให้คำตอบที่ชัดเจนและถูกต้อง

คำตอบ:
"#;

/// Fill `template` placeholders in a single pass
///
/// Substituted values are never rescanned, so answers that happen to
/// contain `{context}` or similar text are inserted verbatim.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let matched = values.iter().find_map(|(name, value)| {
            let key = format!("{{{}}}", name);
            tail.starts_with(&key).then(|| (key.len(), *value))
        });

        match matched {
            Some((len, value)) => {
                out.push_str(value);
                rest = &tail[len..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Build the grading prompt for one answer
pub fn build_grading_prompt(
    context: &str,
    question: &str,
    student_answer: &str,
    reference_answer: &str,
) -> String {
    fill(
        GRADING_TEMPLATE,
        &[
            ("context", context),
            ("question", question),
            ("student_answer", student_answer),
            ("reference_answer", reference_answer),
        ],
    )
}

/// Build the question-answering prompt
pub fn build_query_prompt(context: &str, question: &str) -> String {
    fill(QUERY_TEMPLATE, &[("question", question), ("context", context)])
}
