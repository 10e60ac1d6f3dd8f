pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Itinera - AI Travel Agent</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; color: #222; }
  textarea, input { width: 100%; box-sizing: border-box; padding: .5rem; margin: .25rem 0 .75rem; font: inherit; }
  button { padding: .5rem 1.25rem; font: inherit; cursor: pointer; }
  #answer { white-space: pre-wrap; border: 1px solid #ddd; border-radius: 4px; padding: 1rem; min-height: 4rem; }
  .error { color: #b00020; }
  .muted { color: #666; font-size: .9rem; }
</style>
</head>
<body>
<h1>AI Travel Agent</h1>
<p>Enter a travel query below (e.g. "Flights from New York to London June 10-15, and 4-star hotels").</p>

<form id="query-form">
  <label for="query">Travel Query</label>
  <textarea id="query" rows="3" placeholder="Type your travel query here..."></textarea>
  <button type="submit">Get Travel Information</button>
</form>

<h2>Travel Info</h2>
<div id="answer"></div>
<p id="meta" class="muted"></p>

<hr>
<h2>Send the Above Info via Email</h2>
<p class="muted">The email body will be exactly what the agent printed above.</p>
<form id="email-form">
  <label for="sender">Sender Email (optional)</label>
  <input id="sender" type="email">
  <label for="recipient">Receiver Email</label>
  <input id="recipient" type="email">
  <label for="subject">Subject</label>
  <input id="subject" value="{{DEFAULT_SUBJECT}}">
  <button type="submit">Send Email</button>
</form>
<p id="email-status"></p>

<script>
async function postJson(url, payload) {
  const res = await fetch(url, {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify(payload),
  });
  return res.json();
}

document.getElementById("query-form").addEventListener("submit", async (e) => {
  e.preventDefault();
  const answer = document.getElementById("answer");
  const meta = document.getElementById("meta");
  answer.className = "";
  answer.textContent = "Searching...";
  meta.textContent = "";
  try {
    const data = await postJson("/api/query", { query: document.getElementById("query").value });
    if (data.error) {
      answer.className = "error";
      answer.textContent = data.error.kind + ": " + data.error.message;
    } else {
      answer.textContent = data.answer;
      meta.textContent = data.steps + " reasoning steps, episode " + data.episode_id;
    }
  } catch (err) {
    answer.className = "error";
    answer.textContent = String(err);
  }
});

document.getElementById("email-form").addEventListener("submit", async (e) => {
  e.preventDefault();
  const status = document.getElementById("email-status");
  status.className = "";
  status.textContent = "Sending...";
  try {
    const data = await postJson("/api/email", {
      body: document.getElementById("answer").textContent,
      sender: document.getElementById("sender").value,
      recipient: document.getElementById("recipient").value,
      subject: document.getElementById("subject").value,
    });
    if (data.error) {
      status.className = "error";
      status.textContent = data.error.message;
    } else {
      status.textContent = "Email sent successfully!";
    }
  } catch (err) {
    status.className = "error";
    status.textContent = String(err);
  }
});
</script>
</body>
</html>
"#;
