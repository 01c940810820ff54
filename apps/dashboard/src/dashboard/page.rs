// Single-page front end. Calls the JSON API and hands the rows to Plotly.

pub const INDEX_HTML: &str = r##"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>COVID-19 Dashboard</title>
  <script src="https://cdn.plot.ly/plotly-2.27.0.min.js"></script>
  <style>
    body { background-color: #f8f5f1; color: #130654; font-family: Arial, sans-serif; margin: 0; display: flex; }
    aside { width: 240px; padding: 16px; background: #ece7df; min-height: 100vh; box-sizing: border-box; }
    main { flex: 1; padding: 16px 24px; max-width: 1000px; }
    label { display: block; margin: 12px 0 4px; font-weight: 600; }
    select { width: 100%; padding: 6px; }
    .card { background: white; border-radius: 8px; padding: 12px; margin: 14px 0; }
    .notice { background: #fff4d6; border-radius: 6px; padding: 10px; }
    .table-wrap { max-height: 320px; overflow: auto; }
    table { border-collapse: collapse; font-size: 0.85rem; width: 100%; }
    th, td { border-bottom: 1px solid #eee; padding: 4px 6px; text-align: right; }
    th:first-child, td:first-child { text-align: left; }
    td.max { background: yellow; }
  </style>
</head>
<body>
  <aside>
    <h2>COVID-19 Dashboard</h2>
    <label for="metric">Feature Selection</label>
    <select id="metric"></select>
    <label for="country">Country</label>
    <select id="country" disabled></select>
    <p id="country-note" style="font-size:0.85rem"></p>
    <h3>About</h3>
    <p style="font-size:0.85rem">Data: COVID-19 Data Repository by the Center for Systems Science and
      Engineering (CSSE) at Johns Hopkins University.</p>
  </aside>
  <main>
    <h1>COVID-19 Dashboard</h1>
    <div id="fatal" class="notice" hidden></div>

    <div class="card">
      <h3>COVID-19 Data <a id="csv-link" href="#" style="font-size:0.8rem">download CSV</a></h3>
      <div class="table-wrap"><table id="table"></table></div>
    </div>

    <div class="card">
      <h3 id="map-title"></h3>
      <p id="map-desc" style="font-size:0.85rem"></p>
      <div id="map"></div>
    </div>

    <div class="card">
      <h3 id="bar-title"></h3>
      <div id="bar"></div>
    </div>

    <div class="card">
      <h3 id="series-title">Time series</h3>
      <div id="series-note" class="notice" hidden></div>
      <div id="series"></div>
    </div>
  </main>

  <script>
    const metricEl = document.getElementById('metric');
    const countryEl = document.getElementById('country');
    let sessionId = null;
    let projection = 'robinson';

    async function getJson(path, options) {
      const response = await fetch(path, options);
      const body = await response.json();
      if (!response.ok) throw new Error(body.error ? body.error.message : 'HTTP ' + response.status);
      return body;
    }

    // Upstream strings only ever reach the DOM through textContent.
    function cell(tag, text) {
      const el = document.createElement(tag);
      el.textContent = text;
      return el;
    }

    function option(value, label) {
      const el = document.createElement('option');
      el.value = value;
      el.textContent = label;
      return el;
    }

    function renderTable(rows) {
      const cols = ['country','lat','long','confirmed','deaths','recovered','active','incident_rate','mortality_rate'];
      const max = {};
      for (const c of cols.slice(1)) {
        const values = rows.map(r => r[c]).filter(v => typeof v === 'number');
        if (values.length) max[c] = Math.max(...values);
      }
      const table = document.getElementById('table');
      const head = document.createElement('tr');
      cols.forEach(c => head.appendChild(cell('th', c)));
      table.replaceChildren(head);
      for (const r of rows) {
        const tr = document.createElement('tr');
        for (const c of cols) {
          const td = cell('td', r[c] ?? '');
          if (c in max && r[c] === max[c]) td.className = 'max';
          tr.appendChild(td);
        }
        table.appendChild(tr);
      }
    }

    async function renderMetric() {
      const view = await getJson('/api/v1/sessions/' + sessionId + '/metrics/' + metricEl.value);
      document.getElementById('map-title').textContent = view.metric.title;
      document.getElementById('map-desc').textContent = view.metric.description;
      document.getElementById('bar-title').textContent = "Top " + view.top_n + " ranking by '" + view.metric.title + "'";

      const pts = view.geo_points;
      const maxVal = Math.max(1, ...pts.map(p => p.value));
      Plotly.react('map', [{
        type: 'scattergeo', lat: pts.map(p => p.lat), lon: pts.map(p => p.long),
        text: pts.map(p => p.country), hoverinfo: 'text+z',
        marker: { size: pts.map(p => 4 + 46 * Math.sqrt(Math.max(p.value, 0) / maxVal)),
                  color: pts.map(p => p.value), colorscale: [[0, 'deepskyblue'], [1, 'red']], showscale: true }
      }], { height: 350, margin: { r: 15, t: 15, l: 15, b: 15 }, paper_bgcolor: 'white',
            geo: { projection: { type: projection }, showland: true, landcolor: 'LightGreen',
                   showocean: true, oceancolor: 'LightBlue', coastlinecolor: 'RebeccaPurple' } });

      Plotly.react('bar', [{
        type: 'bar', x: view.ranking.map(r => r.country), y: view.ranking.map(r => r.value),
        marker: { color: view.ranking.map(r => r.value), colorscale: 'Viridis' }
      }], { height: 400, margin: { r: 15, t: 15, l: 40, b: 80 }, paper_bgcolor: 'white' });

      if (!countryEl.disabled && countryEl.value) renderSeries();
    }

    async function renderSeries() {
      const note = document.getElementById('series-note');
      const url = '/api/v1/sessions/' + sessionId + '/timeseries?country=' +
        encodeURIComponent(countryEl.value) + '&metric=' + metricEl.value;
      let panel;
      try {
        panel = await getJson(url);
      } catch (e) {
        note.textContent = e.message; note.hidden = false; Plotly.purge('series'); return;
      }
      document.getElementById('series-title').textContent = panel.country + ' — ' + panel.metric;
      if (panel.series.status !== 'available') {
        note.textContent = panel.series.message; note.hidden = false; Plotly.purge('series'); return;
      }
      note.hidden = true;
      const pts = panel.series.points;
      Plotly.react('series', [{
        type: 'scatter', mode: 'lines', x: pts.map(p => p.date), y: pts.map(p => p.metric_values[panel.metric])
      }], { height: 350, margin: { r: 15, t: 15, l: 50, b: 40 }, paper_bgcolor: 'white' });
    }

    async function init() {
      let session;
      try {
        session = await getJson('/api/v1/sessions', { method: 'POST' });
      } catch (e) {
        const fatal = document.getElementById('fatal');
        fatal.textContent = 'The COVID-19 dataset could not be loaded: ' + e.message;
        fatal.hidden = false;
        return;
      }
      sessionId = session.session_id;
      projection = session.profile.projection;
      document.getElementById('csv-link').href = '/api/v1/sessions/' + sessionId + '/snapshot.csv';
      metricEl.replaceChildren(...session.metrics.map(m => option(m.key, m.title)));
      renderTable(session.table);

      if (session.countries.status === 'ready') {
        countryEl.replaceChildren(option('', '(select a country)'),
          ...session.countries.entries.map(c => option(c.display_name, c.display_name)));
        countryEl.disabled = false;
      } else {
        document.getElementById('country-note').textContent = 'Country selection unavailable: ' + session.countries.reason;
      }

      metricEl.addEventListener('change', renderMetric);
      countryEl.addEventListener('change', () => { if (countryEl.value) renderSeries(); });
      renderMetric();
    }

    init();
  </script>
</body>
</html>
"##;
