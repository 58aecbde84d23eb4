//! The upload page served at `GET /`.
//!
//! Posts the selected files to `/api/convert` and turns the base64 payloads
//! of the JSON report into data-URI download links.

pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>PDF to Word</title>
<style>
  body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; color: #222; }
  fieldset { border: 1px solid #ccc; border-radius: 6px; padding: 1rem; }
  label { display: block; margin: .5rem 0; }
  input[type=number] { width: 5rem; }
  #results li { margin: .3rem 0; }
  .failed { color: #b00020; }
</style>
</head>
<body>
<h1>PDF to Word</h1>
<form id="upload">
  <fieldset>
    <label>PDF file(s) <input type="file" name="pdfFiles" accept=".pdf,application/pdf" multiple required></label>
    <label>Pages (single file only):
      <input type="number" name="start_page" min="1" placeholder="from"> –
      <input type="number" name="end_page" min="1" placeholder="to">
    </label>
    <button type="submit">Convert</button>
  </fieldset>
</form>
<p id="status"></p>
<ul id="results"></ul>
<script>
const DOCX = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const form = document.getElementById("upload");
const statusLine = document.getElementById("status");
const results = document.getElementById("results");

function link(name, mime, base64) {
  const a = document.createElement("a");
  a.href = `data:${mime};base64,${base64}`;
  a.download = name;
  a.textContent = name;
  return a;
}

form.addEventListener("submit", async (event) => {
  event.preventDefault();
  results.replaceChildren();
  statusLine.textContent = "Converting…";
  const response = await fetch("/api/convert", { method: "POST", body: new FormData(form) });
  const contentType = response.headers.get("content-type") || "";
  if (!contentType.includes("application/json")) {
    statusLine.textContent = await response.text();
    return;
  }
  const report = await response.json();
  statusLine.textContent = `${report.stats.succeeded} of ${report.stats.total} converted in ${report.stats.duration_ms} ms`;
  for (const doc of report.documents) {
    const li = document.createElement("li");
    if (doc.status === "succeeded") {
      li.append(link(doc.output_name, DOCX, doc.docx_base64), ` (${doc.conversion_path})`);
    } else {
      li.className = "failed";
      li.textContent = `${doc.name}: ${doc.reason}`;
    }
    results.append(li);
  }
  if (report.archive) {
    const li = document.createElement("li");
    li.append(link(report.archive.file_name, "application/zip", report.archive.zip_base64));
    results.append(li);
  }
});
</script>
</body>
</html>
"#;
