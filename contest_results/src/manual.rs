/*!

This is the long-form manual for `contest_results` and `sos-transform`.

## Input formats

The raw results are JSON snapshots, one `latest.json` file per source directory.
The name of the directory is the category of the snapshot. The following shapes
are recognized, in this order:

### Race list

Any snapshot with a `races` key. Each element of the list is a contest:

```text
{
  "races": [
    {
      "raceTitle": "Governor",
      "Reporting": "12 of 25,000 precincts (0.0%)",
      "candidates": [
        {"Name": "Jane Doe", "Party": "Dem", "Votes": "1,234", "incumbent": true},
        {"Name": "John Roe", "Party": "Rep", "Votes": "987"}
      ]
    }
  ]
}
```

### `supreme-court`

Retention votes. Each justice becomes a contest titled
`Retain Supreme Court Justice {Name}` with a `Yes` and a `No` candidate.

```text
{
  "supreme-court": [{"Name": "Smith", "yesVotes": "100", "noVotes": "50"}],
  "Reporting": "80%"
}
```

### `ballot-measures`

Each measure becomes a contest titled `Proposition {Number}: {Name}` with a
`Yes` and a `No` candidate.

```text
{
  "ballot-measures": [{"Number": "1", "Name": "Tax Reform", "yesVotes": "10", "noVotes": "0"}],
  "Reporting": "100%"
}
```

### Single contest

Anything else is read as one contest, with the same keys as an element of a
race list.

`Reporting` is published as `precincts_reporting`. It is always written as a
string: a snapshot with `"Reporting": 12.5` gives `"precincts_reporting": "12.5"`.

Vote counts are strings as published (`"1,234"`). Thousands separators and
surrounding spaces are ignored. Anything else that is not a non-negative integer
stops the whole run.

## Corrections

Corrections are maintained by hand in a CSV file (or an Excel `.xlsx` file)
with the following columns:

|               column | meaning                                                       |
|----------------------|---------------------------------------------------------------|
|           `raw_name` | the title of the contest, exactly as published (mandatory)    |
|            `include` | `yes` keeps the contest, any other value (even empty) drops it |
|         `clean_name` | the name to publish instead of the raw title                  |
|  `clean_description` | a description of the contest                                  |
|    `clean_geography` | the area covered by the contest                               |
|          `incumbent` | the names of the incumbents, as a single cell                 |

Except for `include`, empty cells mean "no correction" for this field. A contest
that does not appear in this table is published as is. If a title appears twice,
the last row wins.

The slug of a contest is always derived from the raw title. Renaming a contest
with `clean_name` does not change its slug. Accented letters are transliterated,
apostrophes separate words and commas inside numbers are dropped:
`José Núñez` gives `jose-nunez`, `Women's Rights` gives `women-s-rights` and
`Measure $1,000 Tax` gives `measure-1000-tax`.

## Output

Each run writes the same content to `{scraped_datetime}.json` and `latest.json`:

```text
{
  "races": [
    {
      "candidates": [
        {"incumbent": null, "name": "Yes", "party": null, "votes": 100, "votes_percent": 0.6667},
        {"incumbent": null, "name": "No", "party": null, "votes": 50, "votes_percent": 0.3333}
      ],
      "description": null,
      "geography": null,
      "name": "Retain Supreme Court Justice Smith",
      "precincts_reporting": "80%",
      "slug": "retain-supreme-court-justice-smith"
    }
  ],
  "scraped_datetime": "2022-11-08T21:05:00.123456-08:00"
}
```

## Configuration

`sos-transform` runs without arguments. The locations of the raw data, of the
transformed data and of the corrections can be changed with a JSON configuration
file (`--config`) or with the command line flags, which take precedence.

```text
{
  "rawDataDirectory": "data/raw/ca_secretary_of_state",
  "transformedDataDirectory": "data/transformed/ca_secretary_of_state",
  "correctionsPath": "corrections/ca_secretary_of_state.csv",
  "correctionsWorksheet": "Sheet1"
}
```

Relative paths are resolved from the directory of the configuration file.

 */
