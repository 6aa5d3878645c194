//! The Node.js analysis script deployed into each session.
//!
//! The script reads its parameters from the session environment, writes
//! its JSON result to [`RESULT_FILE`] and echoes the same payload on a
//! line prefixed with [`RESULT_SENTINEL`].

/// Directory holding every file the orchestrator creates in a session.
pub const WORK_DIR: &str = "/tmp/glowworm";

/// Deployed script path.
pub const SCRIPT_FILE: &str = "/tmp/glowworm/analyze.js";

/// Structured result written by the script.
pub const RESULT_FILE: &str = "/tmp/glowworm/result.json";

/// Prefix of the stdout line carrying the result payload.
pub const RESULT_SENTINEL: &str = "GLOWWORM_RESULT:";

/// Heredoc delimiter used when deploying the script.
pub const HEREDOC_DELIMITER: &str = "GLOWWORM_SCRIPT_EOF";

/// Dependencies installed when no snapshot is available.
pub const FRESH_INSTALL: &str = "npm install --no-audit --no-fund sharp openai";

const TEMPLATE: &str = r#"const fs = require('fs');

const RESULT_FILE = '__RESULT_FILE__';
const SENTINEL = '__SENTINEL__';

const ENDPOINTS = {
  openai: 'https://api.openai.com/v1/chat/completions',
  xai: 'https://api.x.ai/v1/chat/completions',
};

function emit(payload) {
  const json = JSON.stringify(payload);
  fs.writeFileSync(RESULT_FILE, json);
  console.log(SENTINEL + json);
}

async function describeImage(buffer) {
  const provider = process.env.AI_PROVIDER || 'openai';
  const endpoint = ENDPOINTS[provider];
  const key = provider === 'xai' ? process.env.XAI_API_KEY : process.env.OPENAI_API_KEY;
  if (!endpoint || !key) {
    return null;
  }
  const mime = process.env.MIME_TYPE || 'image/jpeg';
  const response = await fetch(endpoint, {
    method: 'POST',
    headers: { 'Content-Type': 'application/json', Authorization: `Bearer ${key}` },
    body: JSON.stringify({
      model: process.env.MODEL_TYPE,
      max_tokens: 500,
      messages: [{
        role: 'user',
        content: [
          { type: 'text', text: 'Describe this image as JSON with keys description, objects, colors, mood, confidence. Respond with JSON only.' },
          { type: 'image_url', image_url: { url: `data:${mime};base64,${buffer.toString('base64')}` } },
        ],
      }],
    }),
  });
  if (!response.ok) {
    throw new Error(`${provider} returned HTTP ${response.status}`);
  }
  const body = await response.json();
  const text = (body.choices?.[0]?.message?.content || '').replace(/^```(json)?|```$/g, '').trim();
  return JSON.parse(text);
}

async function imageMetadata(buffer) {
  try {
    const sharp = require('sharp');
    const { width, height, format } = await sharp(buffer).metadata();
    return { width, height, format };
  } catch (err) {
    return {};
  }
}

async function main() {
  const type = process.env.PROCESSING_TYPE;
  const buffer = fs.readFileSync(`__WORK_DIR__/${process.env.FILE_NAME}`);
  const result = { type, bytes: buffer.length, complexity: process.env.COMPLEXITY };

  if (type === 'image') {
    result.metadata = await imageMetadata(buffer);
    const analysis = await describeImage(buffer);
    if (analysis) {
      result.aiAnalysis = analysis;
    }
  }
  emit(result);
}

main().catch((err) => {
  emit({ error: String(err && err.message ? err.message : err) });
  process.exitCode = 1;
});
"#;

/// Render the analysis script.
pub fn render() -> String {
    TEMPLATE
        .replace("__RESULT_FILE__", RESULT_FILE)
        .replace("__SENTINEL__", RESULT_SENTINEL)
        .replace("__WORK_DIR__", WORK_DIR)
}

/// Shell command writing the script through a quoted heredoc.
pub fn deploy_command() -> String {
    format!(
        "cat > {SCRIPT_FILE} << '{HEREDOC_DELIMITER}'\n{}\n{HEREDOC_DELIMITER}",
        render()
    )
}
