use crate::habits::STREAK_HABITS;
use crate::models::{DayRecord, Preview, StreakStates, TerminalState};
use crate::score::ScoreSnapshot;

pub fn render_index(
    record: &DayRecord,
    preview: &Preview,
    score: &ScoreSnapshot,
    streaks: &StreakStates,
) -> String {
    let status = if record.finalized {
        match record.terminal_state {
            Some(TerminalState::Completed) => "Finalized: completed",
            Some(TerminalState::Missed) => "Finalized: missed",
            _ => "Finalized",
        }
    } else {
        "Open"
    };

    let preview_text = if record.finalized {
        String::new()
    } else if preview.failing_habits.is_empty() {
        "Finalizing now would complete the day.".to_string()
    } else {
        format!(
            "Finalizing now would miss the day: {}",
            escape_html(&preview.failing_habits.join(", "))
        )
    };

    let streak_rows: String = STREAK_HABITS
        .iter()
        .map(|habit| {
            let state = streaks.get(habit).cloned().unwrap_or_default();
            let note = if state.is_recovering() {
                format!(" (recovering, {} left)", state.recovery_days_remaining)
            } else {
                String::new()
            };
            format!(
                "<li><span>{}</span><strong>{}</strong><em>best {}{}</em></li>",
                habit.display_name(),
                state.current,
                state.best,
                note
            )
        })
        .collect();

    let mits: Vec<String> = record
        .mits
        .iter()
        .enumerate()
        .map(|(idx, mit)| {
            format!(
                r#"<label class="mit"><input type="checkbox" name="mit_done_{idx}" {checked}/><input type="text" name="mit_text_{idx}" value="{text}" placeholder="Priority {n}"/></label>"#,
                checked = if mit.done { "checked" } else { "" },
                text = escape_html(&mit.text),
                n = idx + 1,
            )
        })
        .collect();

    INDEX_HTML
        .replace("{{DATE}}", &record.date.to_string())
        .replace("{{STATUS}}", status)
        .replace("{{SCORE}}", &score.score.to_string())
        .replace("{{PREVIEW}}", &preview_text)
        .replace("{{STREAKS}}", &streak_rows)
        .replace("{{MITS}}", &mits.join(""))
        .replace(
            "{{WAKE}}",
            &record
                .wake_time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
        )
        .replace("{{LEARNING_DONE}}", checked(record.learning_done))
        .replace("{{LEARNING_HOURS}}", &record.learning_hours.to_string())
        .replace("{{LEARNING_TOPIC}}", &escape_html(&record.learning_topic))
        .replace("{{WORKOUT_DONE}}", checked(record.workout_done))
        .replace("{{WORKOUT_TYPE}}", &escape_html(&record.workout_type))
        .replace("{{SCREEN}}", &record.screen_time_hours.to_string())
        .replace("{{MOOD}}", &record.mood.map(|m| m.to_string()).unwrap_or_default())
        .replace("{{DISABLED}}", if record.finalized { "disabled" } else { "" })
}

fn checked(value: bool) -> &'static str {
    if value { "checked" } else { "" }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Dashboard</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #26292b;
      --accent: #2f6f5e;
      --warn: #b5452c;
      --card: #ffffff;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: start center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(820px, 100%);
      display: grid;
      gap: 20px;
    }

    .card {
      background: var(--card);
      border-radius: 18px;
      padding: 20px 24px;
      box-shadow: 0 12px 32px rgba(38, 41, 43, 0.08);
    }

    header {
      display: flex;
      justify-content: space-between;
      align-items: baseline;
    }

    h1 {
      margin: 0;
      font-size: 1.8rem;
    }

    .score {
      font-size: 2.6rem;
      font-weight: 700;
      color: var(--accent);
    }

    ul.streaks {
      list-style: none;
      padding: 0;
      margin: 0;
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    ul.streaks li {
      display: grid;
      gap: 4px;
    }

    ul.streaks strong {
      font-size: 1.6rem;
    }

    form {
      display: grid;
      gap: 12px;
    }

    label {
      display: flex;
      gap: 10px;
      align-items: center;
    }

    input[type="text"], input[type="number"], input[type="time"] {
      padding: 6px 8px;
      border: 1px solid #c9c4b8;
      border-radius: 8px;
      flex: 1;
    }

    .actions {
      display: flex;
      gap: 12px;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent);
      color: white;
    }

    button.finalize {
      background: var(--warn);
    }

    #status[data-type="error"] {
      color: var(--warn);
    }
  </style>
</head>
<body>
  <main class="app">
    <header class="card">
      <div>
        <h1>{{DATE}}</h1>
        <p>{{STATUS}}</p>
        <p id="preview">{{PREVIEW}}</p>
      </div>
      <div class="score" title="Life score">{{SCORE}}</div>
    </header>

    <section class="card">
      <ul class="streaks">{{STREAKS}}</ul>
    </section>

    <section class="card">
      <form id="day-form">
        <label>Wake time <input type="time" name="wake_time" value="{{WAKE}}" {{DISABLED}}/></label>
        <label><input type="checkbox" name="learning_done" {{LEARNING_DONE}} {{DISABLED}}/> Learning
          <input type="number" step="0.25" min="0" max="24" name="learning_hours" value="{{LEARNING_HOURS}}" {{DISABLED}}/>
          <input type="text" name="learning_topic" value="{{LEARNING_TOPIC}}" placeholder="Topic" {{DISABLED}}/></label>
        <label><input type="checkbox" name="workout_done" {{WORKOUT_DONE}} {{DISABLED}}/> Workout
          <input type="text" name="workout_type" value="{{WORKOUT_TYPE}}" placeholder="Type" {{DISABLED}}/></label>
        <label>Screen time (h) <input type="number" step="0.25" min="0" max="24" name="screen_time_hours" value="{{SCREEN}}" {{DISABLED}}/></label>
        <label>Mood (1-5) <input type="number" min="1" max="5" name="mood" value="{{MOOD}}" {{DISABLED}}/></label>
        {{MITS}}
        <div class="actions">
          <button type="submit" {{DISABLED}}>Save</button>
          <button type="button" class="finalize" id="finalize" {{DISABLED}}>Finalize day</button>
        </div>
        <p id="status"></p>
      </form>
    </section>
  </main>

  <script>
    const form = document.getElementById('day-form');
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const collect = () => {
      const data = new FormData(form);
      const number = (name) => {
        const raw = data.get(name);
        return raw === null || raw === '' ? 0 : Number(raw);
      };
      const mits = [0, 1, 2].map((idx) => ({
        text: data.get(`mit_text_${idx}`) || '',
        done: data.get(`mit_done_${idx}`) !== null
      }));
      return {
        wake_time: data.get('wake_time') || '',
        learning_done: data.get('learning_done') !== null,
        learning_hours: number('learning_hours'),
        learning_topic: data.get('learning_topic') || '',
        workout_done: data.get('workout_done') !== null,
        workout_type: data.get('workout_type') || '',
        screen_time_hours: number('screen_time_hours'),
        mood: number('mood'),
        mits
      };
    };

    const request = async (method, url, body) => {
      const res = await fetch(url, {
        method,
        headers: { 'content-type': 'application/json' },
        body: body ? JSON.stringify(body) : undefined
      });
      if (!res.ok) {
        const msg = await res.text();
        throw new Error(msg || 'Request failed');
      }
      return res.json();
    };

    form.addEventListener('submit', (event) => {
      event.preventDefault();
      setStatus('Saving...', 'info');
      request('PUT', '/api/today', collect())
        .then(() => window.location.reload())
        .catch((err) => setStatus(err.message, 'error'));
    });

    document.getElementById('finalize').addEventListener('click', () => {
      setStatus('Finalizing...', 'info');
      request('PUT', '/api/today', collect())
        .then(() => request('POST', '/api/today/finalize'))
        .then(() => window.location.reload())
        .catch((err) => setStatus(err.message, 'error'));
    });
  </script>
</body>
</html>
"#;
